//! Application constants

/// Inspect every 13th frame unless configured otherwise
pub const DEFAULT_SAMPLING_INTERVAL: i64 = 13;

/// Label that raises an alert unless configured otherwise
pub const DEFAULT_TARGET_CLASSES: &str = "Leopard";

/// Maximum upload size for videos (500 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

/// Default YOLO confidence cut-off
pub const DEFAULT_DETECTOR_MIN_CONFIDENCE: f32 = 0.25;

pub const DEFAULT_DETECTOR_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FRAME_READ_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 8;

pub const DEFAULT_ALERT_TITLE: &str = "🚨 Alert!";
pub const DEFAULT_ALERT_BODY: &str = "Suspicious object detected in uploaded video.";

/// OAuth scope required by the FCM HTTP v1 API
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

/// Refresh cached access tokens this many seconds before they expire
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime requested for service-account JWT assertions (Google caps this at one hour)
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;
