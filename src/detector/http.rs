//! Detector backed by a remote inference endpoint.
//!
//! Each sampled frame is JPEG-encoded and POSTed as the request body. The
//! endpoint answers with
//! `{"detections": [{"label": "Leopard", "confidence": 0.91}, ...]}`;
//! `class` and `name` are accepted as aliases of `label` so a stock
//! ultralytics/YOLO serving wrapper can be used directly.

use async_trait::async_trait;
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

use super::{Detection, Detector};
use crate::error::DetectionError;
use crate::video::Frame;

const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<DetectedObject>,
}

#[derive(Debug, Deserialize)]
struct DetectedObject {
    #[serde(alias = "class", alias = "name")]
    label: String,
    #[serde(default = "full_confidence")]
    confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

pub struct HttpDetector {
    client: reqwest::Client,
    url: String,
    min_confidence: f32,
}

impl HttpDetector {
    pub fn new(
        url: impl Into<String>,
        min_confidence: f32,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            min_confidence,
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn classify(&self, frame: &Frame) -> Result<Detection, DetectionError> {
        let jpeg = encode_jpeg(frame)?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(jpeg)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DetectResponse = response.json().await?;
        Ok(to_detection(parsed, self.min_confidence))
    }
}

fn to_detection(response: DetectResponse, min_confidence: f32) -> Detection {
    response
        .detections
        .into_iter()
        .filter(|d| d.confidence >= min_confidence)
        .map(|d| d.label)
        .collect()
}

fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, DetectionError> {
    // The encoder panics on a size mismatch
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.rgb.len() != expected {
        return Err(DetectionError::Encode {
            index: frame.index,
            reason: format!("expected {} RGB bytes, got {}", expected, frame.rgb.len()),
        });
    }

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| DetectionError::Encode {
            index: frame.index,
            reason: e.to_string(),
        })?;
    Ok(buf)
}
