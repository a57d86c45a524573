//! Fan-out of one alert to many recipients.
//!
//! Every recipient gets its own attempt. A failure is recorded on that
//! recipient's [`DeliveryOutcome`] and never affects the others; only a
//! failure to obtain the bearer credential aborts the call, since nobody can
//! be reached without it. Failed deliveries are not retried here.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::{AccessToken, CredentialProvider, DeliveryOutcome, Notification, PushTransport, Recipient};
use crate::error::{DispatchError, TransportError};

pub struct Dispatcher {
    credentials: Arc<dyn CredentialProvider>,
    transport: Arc<dyn PushTransport>,
    concurrency: usize,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn PushTransport>,
        concurrency: usize,
        send_timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            transport,
            concurrency: concurrency.max(1),
            send_timeout,
        }
    }

    /// Deliver `notification` to each recipient, at most `concurrency` at a time.
    /// Outcomes come back in recipient order.
    pub async fn dispatch(
        &self,
        notification: &Notification,
        recipients: &[Recipient],
    ) -> Result<Vec<DeliveryOutcome>, DispatchError> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let credential = self.credentials.access_token().await?;

        // Stream owned recipients: a borrowed item makes this future non-`Send`
        let credential = &credential;
        let outcomes: Vec<DeliveryOutcome> = stream::iter(recipients.iter().cloned())
            .map(|recipient| async move {
                self.deliver(credential, &recipient, notification).await
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let delivered = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            delivered,
            failed = outcomes.len() - delivered,
            "alert dispatched"
        );

        Ok(outcomes)
    }

    async fn deliver(
        &self,
        credential: &AccessToken,
        recipient: &Recipient,
        notification: &Notification,
    ) -> DeliveryOutcome {
        let send = self.transport.send(credential, recipient, notification);
        let result = match tokio::time::timeout(self.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.send_timeout)),
        };

        match result {
            Ok(status) => {
                tracing::info!(%recipient, status, "alert sent");
                DeliveryOutcome::delivered(recipient.clone(), status)
            }
            Err(e) => {
                tracing::warn!(%recipient, "alert delivery failed: {}", e);
                DeliveryOutcome::failed(recipient.clone(), &e)
            }
        }
    }
}
