//! Per-upload session state and the one-shot alert gate.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Sampling,
    Evaluating,
    AlertPending,
    Dispatched,
    NoAlert,
    Done,
}

/// One upload-to-result unit of work. Owned by the request that created it;
/// never shared between requests.
#[derive(Debug)]
pub struct VideoSession {
    id: String,
    cursor: u64,
    alert_sent: bool,
    state: SessionState,
}

impl VideoSession {
    pub fn new() -> Self {
        Self {
            id: format!("{:016x}", rand::random::<u64>()),
            cursor: 0,
            alert_sent: false,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dedup gate: true for the first call only, false forever after.
    pub fn should_alert(&mut self) -> bool {
        if self.alert_sent {
            return false;
        }
        self.alert_sent = true;
        true
    }

    pub fn alert_sent(&self) -> bool {
        self.alert_sent
    }

    /// Record frames read so far. The cursor never moves backwards.
    pub fn advance(&mut self, frames_read: u64) {
        self.cursor = self.cursor.max(frames_read);
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "session state");
            self.state = next;
        }
    }
}

impl Default for VideoSession {
    fn default() -> Self {
        Self::new()
    }
}
