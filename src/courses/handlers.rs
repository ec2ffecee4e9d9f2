use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CourseListQuery, CoursePage},
    services,
};
use crate::{error::AppResult, state::AppState};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/", get(list_courses))
}

#[instrument(skip(state, query))]
pub async fn list_courses(
    State(state): State<AppState>,
    query: Option<Query<CourseListQuery>>,
) -> AppResult<Json<CoursePage>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = services::list(state.courses.as_ref(), &query).await?;
    Ok(Json(page))
}
