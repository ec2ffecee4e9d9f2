use serde::Serialize;
use time::OffsetDateTime;

use super::repo::Enrollment;
use crate::courses::repo::Course;

/// Enrollment as returned to its owner, with the course embedded.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    pub id: i64,
    pub course: Option<Course>,
    pub lessons_completed: i32,
    pub progress_percent: f64,
    pub time_spent_minutes: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl EnrollmentView {
    pub fn new(e: Enrollment, course: Option<Course>) -> Self {
        Self {
            id: e.id,
            course,
            lessons_completed: e.lessons_completed,
            progress_percent: e.progress_percent,
            time_spent_minutes: e.time_spent_minutes,
            enrolled_at: e.enrolled_at,
            completed_at: e.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub message: String,
    pub enrollment: EnrollmentView,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentList {
    pub enrollments: Vec<EnrollmentView>,
}
