use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use super::{AccessToken, Notification, PushTransport, Recipient};
use crate::error::TransportError;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: &'a Notification,
}

/// FCM HTTP v1 `messages:send`, one request per device token
pub struct FcmTransport {
    client: reqwest::Client,
    send_url: String,
}

impl FcmTransport {
    pub fn new(endpoint: &str, project_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            send_url: send_url(endpoint, project_id),
        }
    }
}

fn send_url(endpoint: &str, project_id: &str) -> String {
    format!(
        "{}/v1/projects/{}/messages:send",
        endpoint.trim_end_matches('/'),
        project_id
    )
}

#[async_trait]
impl PushTransport for FcmTransport {
    async fn send(
        &self,
        credential: &AccessToken,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<u16, TransportError> {
        let payload = SendRequest {
            message: Message {
                token: recipient.as_str(),
                notification,
            },
        };

        let response = self
            .client
            .post(&self.send_url)
            .header(AUTHORIZATION, format!("Bearer {}", credential.token))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_send_url() {
        assert_eq!(
            send_url("https://fcm.googleapis.com/", "dr-animal"),
            "https://fcm.googleapis.com/v1/projects/dr-animal/messages:send"
        );
    }

    #[test]
    fn payload_matches_fcm_v1_shape() {
        let notification = Notification {
            title: "Alert!".to_string(),
            body: "Suspicious object detected in uploaded video.".to_string(),
        };
        let payload = SendRequest {
            message: Message {
                token: "device-1",
                notification: &notification,
            },
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "message": {
                    "token": "device-1",
                    "notification": {
                        "title": "Alert!",
                        "body": "Suspicious object detected in uploaded video.",
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let transport = FcmTransport::new("http://127.0.0.1:9", "p");
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: chrono::Utc::now(),
        };
        let err = transport
            .send(
                &token,
                &Recipient("device-1".to_string()),
                &Notification {
                    title: "a".to_string(),
                    body: "b".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
        assert_eq!(err.status_code(), None);
    }
}
