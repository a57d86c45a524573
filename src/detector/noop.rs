use async_trait::async_trait;

use super::{Detection, Detector};
use crate::error::DetectionError;
use crate::video::Frame;

/// No-op detector that never finds anything - for running without a model
pub struct NoOpDetector;

impl NoOpDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detector for NoOpDetector {
    async fn classify(&self, _frame: &Frame) -> Result<Detection, DetectionError> {
        Ok(Detection::default())
    }
}
