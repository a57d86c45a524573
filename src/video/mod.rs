use async_trait::async_trait;
use std::path::Path;

use crate::error::SourceError;

mod ffmpeg;
mod sampler;

pub use ffmpeg::{FfmpegOpener, FfmpegSource};
pub use sampler::{FrameSampler, SamplingInterval, ScanEnd};

/// Raw frame decoded from a video, packed RGB24
#[derive(Clone)]
pub struct Frame {
    /// 1-based position in the source
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// A decodable frame sequence read strictly in order.
#[async_trait]
pub trait VideoSource: Send {
    /// Next frame, or `None` once the source is exhausted.
    /// `index` is the 1-based position the frame will carry.
    async fn next_frame(&mut self, index: u64) -> Result<Option<Frame>, SourceError>;

    /// Release the underlying handle. Called exactly once by the sampler.
    async fn release(&mut self);
}

/// Opens a stored upload as a [`VideoSource`].
#[async_trait]
pub trait VideoOpener: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, SourceError>;
}
