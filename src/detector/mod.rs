use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::DetectionError;
use crate::video::Frame;

mod http;
mod noop;

pub use http::HttpDetector;
pub use noop::NoOpDetector;

/// Unordered set of class labels found in one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    labels: HashSet<String>,
}

impl Detection {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Detection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pluggable frame classifier.
///
/// Loaded once at start-up and shared by every session, so implementations
/// must be safe to call concurrently. An empty [`Detection`] is a valid result.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn classify(&self, frame: &Frame) -> Result<Detection, DetectionError>;
}
