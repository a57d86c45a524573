//! Error handling helpers for route handlers

use axum::http::StatusCode;

/// Log an error with context and turn it into a status code
pub trait LogErr<T> {
    fn log_500(self, context: &str) -> Result<T, StatusCode>;

    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, StatusCode> {
        self.log_status(context, StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn log_status(self, context: &str, status: StatusCode) -> Result<T, StatusCode> {
        self.map_err(|e| {
            if status.is_server_error() {
                tracing::error!(%status, "{}: {}", context, e);
            } else {
                tracing::warn!(%status, "{}: {}", context, e);
            }
            status
        })
    }
}
