//! Every-Nth-frame sampling over a [`VideoSource`].

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use super::{Frame, VideoOpener, VideoSource};
use crate::error::{ConfigError, SourceError};

/// Number of source frames between two inspected frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingInterval(NonZeroU32);

impl SamplingInterval {
    pub fn new(n: i64) -> Result<Self, ConfigError> {
        u32::try_from(n)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ConfigError::InvalidSamplingInterval(n))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// `cursor` is 1-based.
    pub fn selects(self, cursor: u64) -> bool {
        cursor % u64::from(self.get()) == 0
    }
}

/// Why sampling stopped.
#[derive(Debug)]
pub enum ScanEnd {
    Exhausted,
    /// A read failed mid-stream; frames before it were still inspected.
    Truncated(SourceError),
    /// Closed by the caller before the source ran out.
    Stopped,
}

/// Lazy, non-restartable sequence of sampled frames.
///
/// The source is released exactly once: when it runs out, when a read fails,
/// or on [`FrameSampler::close`], whichever happens first.
pub struct FrameSampler {
    source: Option<Box<dyn VideoSource>>,
    interval: SamplingInterval,
    read_timeout: Duration,
    cursor: u64,
    sampled: u64,
    end: Option<ScanEnd>,
}

impl FrameSampler {
    pub fn new(
        source: Box<dyn VideoSource>,
        interval: SamplingInterval,
        read_timeout: Duration,
    ) -> Self {
        Self {
            source: Some(source),
            interval,
            read_timeout,
            cursor: 0,
            sampled: 0,
            end: None,
        }
    }

    pub async fn open(
        opener: &dyn VideoOpener,
        path: &Path,
        interval: SamplingInterval,
        read_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let source = opener.open(path).await?;
        Ok(Self::new(source, interval, read_timeout))
    }

    /// Next sampled frame, or `None` once sampling has ended.
    pub async fn next(&mut self) -> Option<Frame> {
        loop {
            let source = self.source.as_mut()?;
            let index = self.cursor + 1;

            let read = tokio::time::timeout(self.read_timeout, source.next_frame(index))
                .await
                .unwrap_or_else(|_| Err(SourceError::Timeout { index }));

            match read {
                Ok(Some(frame)) => {
                    self.cursor = index;
                    if self.interval.selects(index) {
                        self.sampled += 1;
                        return Some(frame);
                    }
                }
                Ok(None) => {
                    self.release(ScanEnd::Exhausted).await;
                    return None;
                }
                Err(e) => {
                    tracing::warn!(frames_read = self.cursor, "stopping scan early: {}", e);
                    self.release(ScanEnd::Truncated(e)).await;
                    return None;
                }
            }
        }
    }

    /// Release the source if it is still open.
    pub async fn close(&mut self) {
        self.release(ScanEnd::Stopped).await;
    }

    async fn release(&mut self, end: ScanEnd) {
        if let Some(mut source) = self.source.take() {
            source.release().await;
            self.end = Some(end);
        }
    }

    /// Frames read from the source so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn sampled(&self) -> u64 {
        self.sampled
    }

    pub fn end(&self) -> Option<&ScanEnd> {
        self.end.as_ref()
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        if self.source.is_some() {
            tracing::warn!(
                frames_read = self.cursor,
                "frame sampler dropped without releasing its source"
            );
        }
    }
}
