//! Device token registry used as the alert recipient list

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::push as domain_push;
use crate::services::error::LogErr;

pub fn routes() -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/push/tokens", post(register_token).delete(remove_token))
        .route("/push/tokens/count", get(count_tokens));

    // Burst of 20, then one request every 500ms per client IP
    match GovernorConfigBuilder::default()
        .per_millisecond(500)
        .burst_size(20)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
    {
        Some(config) => router.layer(GovernorLayer {
            config: config.into(),
        }),
        None => {
            tracing::warn!("invalid rate limit settings; token routes are not rate limited");
            router
        }
    }
}

#[derive(Deserialize)]
struct TokenRequest {
    token: String,
}

#[derive(Serialize)]
struct TokenCountResponse {
    count: i64,
}

async fn register_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<StatusCode, StatusCode> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    domain_push::upsert_token(&state.db, token)
        .await
        .log_500("Failed to register push token")?;

    tracing::info!("push token registered");
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<StatusCode, StatusCode> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let removed = domain_push::delete_token(&state.db, token)
        .await
        .log_500("Failed to remove push token")?;

    if removed {
        tracing::info!("push token removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn count_tokens(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenCountResponse>, StatusCode> {
    let count = domain_push::count_tokens(&state.db)
        .await
        .log_500("Failed to count push tokens")?;

    Ok(Json(TokenCountResponse { count }))
}
