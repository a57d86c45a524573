//! Service-account credentials for the FCM HTTP v1 API.
//!
//! A signed RS256 JWT assertion is exchanged at the key's `token_uri` for a
//! bearer token (OAuth 2.0 JWT bearer grant). The token is cached and
//! refreshed on demand once it is within the refresh margin of expiry.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{AccessToken, CredentialProvider};
use crate::constants::{ASSERTION_LIFETIME_SECS, FCM_SCOPE, TOKEN_REFRESH_MARGIN_SECS};
use crate::error::{AuthError, ConfigError};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service account key file we use
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let fail = |reason: String| ConfigError::ServiceAccount {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| fail(e.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct ServiceAccountCredentials {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    timeout: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl ServiceAccountCredentials {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, ConfigError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            ConfigError::ServiceAccount {
                path: key.client_email.clone(),
                reason: format!("invalid private key: {}", e),
            }
        })?;

        Ok(Self {
            key,
            encoding_key,
            client: reqwest::Client::new(),
            timeout,
            cached: Mutex::new(None),
        })
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    fn sign_assertion(&self) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// The whole exchange, body included, runs under the configured timeout.
    async fn fetch_token(&self) -> Result<AccessToken, AuthError> {
        tokio::time::timeout(self.timeout, self.exchange())
            .await
            .map_err(|_| AuthError::Timeout)?
    }

    async fn exchange(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.sign_assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl CredentialProvider for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let mut cached = self.cached.lock().await;

        let margin = ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if let Some(token) = cached.as_ref() {
            if token.expires_at - margin > Utc::now() {
                return Ok(token.clone());
            }
        }

        tracing::debug!(client = %self.key.client_email, "refreshing push access token");
        let token = self.fetch_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
