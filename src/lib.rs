pub mod config;
pub mod constants;
pub mod detector;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod logging;
pub mod pipeline;
pub mod push;
pub mod routes;
pub mod services;
pub mod session;
pub mod storage;
pub mod video;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use pipeline::Pipeline;
use storage::UploadStore;
use video::VideoOpener;

/// Long-lived collaborators shared by every request
pub struct AppState {
    pub db: PgPool,
    pub pipeline: Arc<Pipeline>,
    pub opener: Arc<dyn VideoOpener>,
    pub uploads: UploadStore,
}

/// Routes plus the middleware stack, ready to serve.
pub fn build_app(state: Arc<AppState>, cors_origins: &[String], max_upload_bytes: usize) -> Router {
    routes::build_routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Serve `app` until the listener fails. Peer addresses are attached to each
/// request because the token routes rate limit per client IP.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}
