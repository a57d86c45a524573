//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::detector::{Detection, Detector};
use crate::error::{AuthError, DetectionError, SourceError, TransportError};
use crate::push::{
    AccessToken, CredentialProvider, Notification, PushTransport, Recipient, RecipientDirectory,
};
use crate::video::{Frame, VideoOpener, VideoSource};

pub fn recipients(n: usize) -> Vec<Recipient> {
    (1..=n).map(|i| Recipient(format!("device-{}", i))).collect()
}

/// Emits `total` tiny frames, optionally failing or hanging at one index.
pub struct ScriptedSource {
    total: u64,
    fail_at: Option<u64>,
    stall_at: Option<u64>,
    pub releases: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            fail_at: None,
            stall_at: None,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn stalling_at(mut self, index: u64) -> Self {
        self.stall_at = Some(index);
        self
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    async fn next_frame(&mut self, index: u64) -> Result<Option<Frame>, SourceError> {
        if self.stall_at == Some(index) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_at == Some(index) {
            return Err(SourceError::Read {
                index,
                source: std::io::Error::other("corrupt packet"),
            });
        }
        if index > self.total {
            return Ok(None);
        }
        Ok(Some(Frame {
            index,
            width: 2,
            height: 2,
            rgb: vec![0; 12],
        }))
    }

    async fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Every open fails as if the file were not a video.
pub struct FailingOpener;

#[async_trait]
impl VideoOpener for FailingOpener {
    async fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, SourceError> {
        Err(SourceError::Unreadable(format!("{}: not a video", path.display())))
    }
}

/// Returns preset labels per frame index.
#[derive(Default)]
pub struct ScriptedDetector {
    labels: HashMap<u64, Vec<String>>,
    failing: HashSet<u64>,
    pub calls: Mutex<Vec<u64>>,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, index: u64, labels: &[&str]) -> Self {
        self.labels
            .insert(index, labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn failing_at(mut self, index: u64) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn classified(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn classify(&self, frame: &Frame) -> Result<Detection, DetectionError> {
        self.calls.lock().unwrap().push(frame.index);
        if self.failing.contains(&frame.index) {
            return Err(DetectionError::Status {
                status: 500,
                body: "model crashed".to_string(),
            });
        }
        Ok(self
            .labels
            .get(&frame.index)
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default())
    }
}

pub struct FakeCredentials {
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeCredentials {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::Status {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        Ok(AccessToken {
            token: "fake-token".to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    }
}

#[derive(Default)]
pub struct FakeTransport {
    failing: HashSet<String>,
    stalling: HashSet<String>,
    delay: Option<Duration>,
    sent: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn stalling_for(mut self, token: &str) -> Self {
        self.stalling.insert(token.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn send(
        &self,
        _credential: &AccessToken,
        recipient: &Recipient,
        _notification: &Notification,
    ) -> Result<u16, TransportError> {
        self.sent.lock().unwrap().push(recipient.0.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.stalling.contains(&recipient.0) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&recipient.0) {
            return Err(TransportError::Status {
                status: 404,
                body: "UNREGISTERED".to_string(),
            });
        }
        Ok(200)
    }
}

pub struct FakeDirectory {
    recipients: Vec<Recipient>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            recipients: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecipientDirectory for FakeDirectory {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.recipients.clone())
    }
}
