use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use crate::AppState;
use crate::domain::contacts::{self, Contact, NewContact};
use crate::services::error::LogErr;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/contacts", get(list_contacts).post(add_contact))
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, StatusCode> {
    let contacts = contacts::list_contacts(&state.db)
        .await
        .log_500("Failed to list contacts")?;

    Ok(Json(contacts))
}

async fn add_contact(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewContact>,
) -> Result<(StatusCode, Json<Contact>), StatusCode> {
    let contact = request.normalized().ok_or(StatusCode::BAD_REQUEST)?;

    let created = contacts::insert_contact(&state.db, &contact)
        .await
        .log_500("Failed to add contact")?;

    Ok((StatusCode::CREATED, Json(created)))
}
