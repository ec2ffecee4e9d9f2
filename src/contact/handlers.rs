use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use tracing::instrument;

use super::services::{self, ContactRequest};
use crate::{auth::jwt::MaybeAuthUser, error::AppResult, extract::JsonBody, state::AppState};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: &'static str,
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(send_message))
        .route("/contact/", post(send_message))
}

#[instrument(skip(state, req))]
pub async fn send_message(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    JsonBody(req): JsonBody<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    services::submit(state.contacts.as_ref(), user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            message: "Message received! We'll reply within 24h.",
        }),
    ))
}
