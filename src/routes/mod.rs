pub mod contacts;
pub mod health;
pub mod push;
pub mod video;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(video::routes())
        .merge(push::routes())
        .merge(contacts::routes())
}
