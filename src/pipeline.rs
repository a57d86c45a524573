//! Frame sampling → detection → alert decision → dispatch, for one upload.
//!
//! Frames are classified strictly one after another so that the first
//! qualifying frame is the one that opens the session's alert gate. The scan
//! keeps going after an alert so the report covers the whole video.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::detector::Detector;
use crate::error::ProcessError;
use crate::evaluator::{TargetClasses, evaluate};
use crate::push::{DeliveryOutcome, Dispatcher, Notification, RecipientDirectory};
use crate::session::{SessionState, VideoSession};
use crate::video::{FrameSampler, SamplingInterval, ScanEnd, VideoOpener};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub interval: SamplingInterval,
    pub targets: TargetClasses,
    pub frame_read_timeout: Duration,
    pub alert: Notification,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchReport {
    Delivered { outcomes: Vec<DeliveryOutcome> },
    NoRecipients,
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub session_id: String,
    /// Whether the alert gate was triggered, not whether anyone received it
    pub alert_sent: bool,
    pub frames_read: u64,
    pub frames_sampled: u64,
    /// Sampled frames the detector failed on
    pub frames_skipped: u64,
    pub alert_frame: Option<u64>,
    /// A read error ended the scan before the end of the video
    pub scan_truncated: bool,
    pub dispatch: Option<DispatchReport>,
}

pub struct Pipeline {
    detector: Arc<dyn Detector>,
    directory: Arc<dyn RecipientDirectory>,
    dispatcher: Dispatcher,
    settings: ScanSettings,
}

impl Pipeline {
    pub fn new(
        detector: Arc<dyn Detector>,
        directory: Arc<dyn RecipientDirectory>,
        dispatcher: Dispatcher,
        settings: ScanSettings,
    ) -> Self {
        Self {
            detector,
            directory,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scan the video stored at `path`. Fails only if it cannot be opened.
    pub async fn process(
        &self,
        opener: &dyn VideoOpener,
        path: &Path,
    ) -> Result<ScanReport, ProcessError> {
        let mut session = VideoSession::new();
        let span = tracing::info_span!("session", id = %session.id());

        async move {
            let mut sampler = FrameSampler::open(
                opener,
                path,
                self.settings.interval,
                self.settings.frame_read_timeout,
            )
            .await?;
            Ok::<_, ProcessError>(self.run(&mut session, &mut sampler).await)
        }
        .instrument(span)
        .await
    }

    pub async fn run(&self, session: &mut VideoSession, sampler: &mut FrameSampler) -> ScanReport {
        let mut frames_skipped = 0;
        let mut alert_frame = None;
        let mut dispatch = None;

        session.transition(SessionState::Sampling);

        while let Some(frame) = sampler.next().await {
            session.advance(sampler.cursor());
            session.transition(SessionState::Evaluating);

            match self.detector.classify(&frame).await {
                Err(e) => {
                    tracing::warn!(frame = frame.index, "skipping frame: {}", e);
                    frames_skipped += 1;
                }
                Ok(detection) if evaluate(&detection, &self.settings.targets) => {
                    let labels: Vec<&str> = detection.labels().collect();
                    tracing::info!(frame = frame.index, ?labels, "target class detected");

                    if session.should_alert() {
                        session.transition(SessionState::AlertPending);
                        alert_frame = Some(frame.index);
                        dispatch = Some(self.alert().await);
                    }
                }
                Ok(_) => {}
            }

            session.transition(SessionState::Sampling);
        }

        // No-op unless the loop ended without the sampler releasing
        sampler.close().await;
        session.advance(sampler.cursor());

        let outcome = match dispatch {
            Some(DispatchReport::Delivered { .. }) => SessionState::Dispatched,
            _ => SessionState::NoAlert,
        };
        session.transition(outcome);
        session.transition(SessionState::Done);

        let scan_truncated = matches!(sampler.end(), Some(ScanEnd::Truncated(_)));
        tracing::info!(
            frames_read = session.cursor(),
            frames_sampled = sampler.sampled(),
            frames_skipped,
            alert_sent = session.alert_sent(),
            scan_truncated,
            "video processed"
        );

        ScanReport {
            session_id: session.id().to_string(),
            alert_sent: session.alert_sent(),
            frames_read: session.cursor(),
            frames_sampled: sampler.sampled(),
            frames_skipped,
            alert_frame,
            scan_truncated,
            dispatch,
        }
    }

    async fn alert(&self) -> DispatchReport {
        let recipients = match self.directory.list_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!("recipient lookup failed: {}", e);
                return DispatchReport::Failed {
                    error: format!("recipient lookup failed: {}", e),
                };
            }
        };

        if recipients.is_empty() {
            tracing::info!("no recipient tokens registered; nothing to deliver");
            return DispatchReport::NoRecipients;
        }

        match self
            .dispatcher
            .dispatch(&self.settings.alert, &recipients)
            .await
        {
            Ok(outcomes) => DispatchReport::Delivered { outcomes },
            Err(e) => {
                tracing::error!("alert dispatch failed: {}", e);
                DispatchReport::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
