use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{EnrollmentList, EnrollmentResponse, EnrollmentView},
    services::{self, ProgressUpdate},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::JsonBody,
    state::AppState,
};

/// Non-numeric ids behave like an unknown route.
fn parse_course_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Not found."))
}

pub fn enrollment_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/:id/enroll", post(enroll))
        .route("/courses/:id/progress", put(update_progress))
        .route("/courses/my/enrolled", get(my_enrollments))
}

#[instrument(skip(state, path))]
pub async fn enroll(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<(StatusCode, Json<EnrollmentResponse>)> {
    let course_id = parse_course_id(path)?;
    let (enrollment, course) = services::enroll(
        state.courses.as_ref(),
        state.enrollments.as_ref(),
        user_id,
        course_id,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollmentResponse {
            message: format!("Enrolled in {}!", course.title),
            enrollment: EnrollmentView::new(enrollment, Some(course)),
        }),
    ))
}

#[instrument(skip(state, path, update))]
pub async fn update_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<i64>, PathRejection>,
    JsonBody(update): JsonBody<ProgressUpdate>,
) -> AppResult<Json<EnrollmentResponse>> {
    let course_id = parse_course_id(path)?;
    let enrollment = services::update_progress(
        state.courses.as_ref(),
        state.enrollments.as_ref(),
        user_id,
        course_id,
        &update,
    )
    .await?;
    Ok(Json(EnrollmentResponse {
        message: "Progress updated.".into(),
        enrollment,
    }))
}

#[instrument(skip(state))]
pub async fn my_enrollments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<EnrollmentList>> {
    let enrollments = services::list_for_user(state.enrollments.as_ref(), user_id).await?;
    Ok(Json(EnrollmentList { enrollments }))
}
