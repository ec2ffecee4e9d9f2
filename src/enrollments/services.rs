use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use tracing::info;

use super::{
    dto::EnrollmentView,
    repo::{Enrollment, EnrollmentStore, ALREADY_ENROLLED},
};
use crate::{
    courses::repo::{Course, CourseStore},
    error::{AppError, AppResult},
};

/// Caller-supplied progress fields. Values are applied verbatim, without clamping.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ProgressUpdate {
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub lessons_completed: Option<i32>,
    #[serde(deserialize_with = "int_or_numeric_string")]
    pub time_spent_minutes: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i32),
    Str(String),
}

/// Accepts `24` as well as `"24"`; anything else is a type error.
fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrString::Int(n)) => Ok(Some(n)),
        Some(IntOrString::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("not an integer: {s:?}"))),
    }
}

/// Percentage rounded to one decimal (ties to even), or `None` when the course has no lessons.
pub fn progress_percent(lessons_completed: i32, total_lessons: i32) -> Option<f64> {
    if total_lessons <= 0 {
        return None;
    }
    let pct = f64::from(lessons_completed) / f64::from(total_lessons) * 100.0;
    Some((pct * 10.0).round_ties_even() / 10.0)
}

/// Applies `update` in place and fires the one-way completion transition.
/// Returns true only on the call that sets `completed_at`.
pub fn apply_progress(
    enrollment: &mut Enrollment,
    total_lessons: i32,
    update: &ProgressUpdate,
    now: OffsetDateTime,
) -> bool {
    if let Some(n) = update.lessons_completed {
        enrollment.lessons_completed = n;
    }
    if let Some(m) = update.time_spent_minutes {
        enrollment.time_spent_minutes = m;
    }
    if let Some(pct) = progress_percent(enrollment.lessons_completed, total_lessons) {
        enrollment.progress_percent = pct;
    }
    enrollment.last_accessed_at = now;

    if enrollment.progress_percent >= 100.0 && enrollment.completed_at.is_none() {
        enrollment.completed_at = Some(now);
        return true;
    }
    false
}

pub async fn enroll(
    courses: &dyn CourseStore,
    enrollments: &dyn EnrollmentStore,
    user_id: i64,
    course_id: i64,
) -> AppResult<(Enrollment, Course)> {
    let course = courses
        .find_by_id(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found."))?;

    // The (user_id, course_id) unique index is authoritative; this only gives a clean 409.
    if enrollments.find(user_id, course_id).await?.is_some() {
        return Err(AppError::conflict(ALREADY_ENROLLED));
    }

    let enrollment = enrollments.create(user_id, course_id).await?;
    info!(user_id, course_id, enrollment_id = enrollment.id, "user enrolled");
    Ok((enrollment, course))
}

pub async fn update_progress(
    courses: &dyn CourseStore,
    enrollments: &dyn EnrollmentStore,
    user_id: i64,
    course_id: i64,
    update: &ProgressUpdate,
) -> AppResult<EnrollmentView> {
    let outcome = enrollments
        .update_progress(user_id, course_id, update, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| AppError::not_found("Enrollment not found."))?;

    if let Some(cert) = &outcome.certificate {
        info!(user_id, course_id, code = %cert.certificate_code, "certificate issued");
    }

    let course = courses.find_by_id(course_id).await?;
    Ok(EnrollmentView::new(outcome.enrollment, course))
}

pub async fn list_for_user(
    enrollments: &dyn EnrollmentStore,
    user_id: i64,
) -> AppResult<Vec<EnrollmentView>> {
    let rows = enrollments.list_for_user(user_id).await?;
    Ok(rows
        .into_iter()
        .map(|(e, c)| EnrollmentView::new(e, Some(c)))
        .collect())
}
