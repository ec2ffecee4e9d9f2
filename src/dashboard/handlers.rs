use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::services::{self, DashboardStats};
use crate::{auth::jwt::AuthUser, error::AppResult, state::AppState};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = services::stats(
        state.enrollments.as_ref(),
        state.certificates.as_ref(),
        user_id,
    )
    .await?;
    Ok(Json(stats))
}
