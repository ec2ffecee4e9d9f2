use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, MeResponse, ProfileResponse, RegisterRequest},
    jwt::AuthUser,
    repo::ProfileUpdate,
    services,
};
use crate::{error::AppResult, extract::JsonBody, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", put(update_profile))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let (token, user) = services::register(state.users.as_ref(), &state.jwt, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Account created!",
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (token, user) = services::login(state.users.as_ref(), &state.jwt, req).await?;
    Ok(Json(AuthResponse {
        message: "Login successful.",
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = services::get_profile(state.users.as_ref(), user_id).await?;
    Ok(Json(MeResponse { user: user.into() }))
}

#[instrument(skip(state, update))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    let user = services::update_profile(state.users.as_ref(), user_id, &update).await?;
    Ok(Json(ProfileResponse {
        message: "Profile updated.",
        user: user.into(),
    }))
}
