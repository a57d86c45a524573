//! Alert delivery: credentials, the FCM transport and the fan-out dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, TransportError};

mod credentials;
mod dispatcher;
mod transport;

pub use credentials::{ServiceAccountCredentials, ServiceAccountKey};
pub use dispatcher::Dispatcher;
pub use transport::FcmTransport;

/// Opaque device registration token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(pub String);

impl Recipient {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Result of one delivery attempt. Collected for the response and logs only.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub recipient: Recipient,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(recipient: Recipient, status: u16) -> Self {
        Self {
            recipient,
            success: true,
            status: Some(status),
            error: None,
        }
    }

    pub fn failed(recipient: Recipient, error: &TransportError) -> Self {
        Self {
            recipient,
            success: false,
            status: error.status_code(),
            error: Some(error.to_string()),
        }
    }
}

/// Short-lived bearer credential for the push transport
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// A token valid for at least the refresh margin, refreshed if needed.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

/// Sends one message to one recipient.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Returns the transport's 2xx status code.
    async fn send(
        &self,
        credential: &AccessToken,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<u16, TransportError>;
}

/// Registry of recipient tokens, queried fresh for every alert.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, sqlx::Error>;
}
