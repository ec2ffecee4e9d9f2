use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::info;

use super::services::{apply_progress, ProgressUpdate};
use crate::{
    certificates::repo::{issue_if_absent, Certificate},
    courses::repo::{Course, CourseStore},
    error::{conflict_on_unique, AppResult},
    store::PgStore,
};

pub const ALREADY_ENROLLED: &str = "Already enrolled.";

/// A user's registration in one course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub lessons_completed: i32,
    pub progress_percent: f64,
    pub time_spent_minutes: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_accessed_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

/// Result of one progress write.
#[derive(Debug, Clone)]
pub struct ProgressOutcome {
    pub enrollment: Enrollment,
    /// Set only on the write that completed the course and created a certificate.
    pub certificate: Option<Certificate>,
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn find(&self, user_id: i64, course_id: i64) -> AppResult<Option<Enrollment>>;
    /// Fails with `Conflict` when the pair is already enrolled.
    async fn create(&self, user_id: i64, course_id: i64) -> AppResult<Enrollment>;
    /// Read-modify-write of progress plus the completion transition, atomically.
    /// `None` when the user is not enrolled in the course.
    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: &ProgressUpdate,
        now: OffsetDateTime,
    ) -> AppResult<Option<ProgressOutcome>>;
    /// Every enrollment of the user with its course, oldest first.
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(Enrollment, Course)>>;
}

const ENROLLMENT_COLUMNS: &str = "id, user_id, course_id, lessons_completed, progress_percent, \
                                  time_spent_minutes, enrolled_at, last_accessed_at, completed_at";

#[derive(FromRow)]
struct LockedEnrollment {
    #[sqlx(flatten)]
    enrollment: Enrollment,
    total_lessons: i32,
}

#[async_trait]
impl EnrollmentStore for PgStore {
    async fn find(&self, user_id: i64, course_id: i64) -> AppResult<Option<Enrollment>> {
        let row = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = $1 AND course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, user_id: i64, course_id: i64) -> AppResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            INSERT INTO enrollments (user_id, course_id)
            VALUES ($1, $2)
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, ALREADY_ENROLLED))
    }

    async fn update_progress(
        &self,
        user_id: i64,
        course_id: i64,
        update: &ProgressUpdate,
        now: OffsetDateTime,
    ) -> AppResult<Option<ProgressOutcome>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, LockedEnrollment>(
            r#"
            SELECT e.id, e.user_id, e.course_id, e.lessons_completed, e.progress_percent,
                   e.time_spent_minutes, e.enrolled_at, e.last_accessed_at, e.completed_at,
                   c.total_lessons
              FROM enrollments e
              JOIN courses c ON c.id = e.course_id
             WHERE e.user_id = $1 AND e.course_id = $2
               FOR UPDATE OF e
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(LockedEnrollment {
            mut enrollment,
            total_lessons,
        }) = locked
        else {
            return Ok(None);
        };

        let completed_now = apply_progress(&mut enrollment, total_lessons, update, now);

        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            UPDATE enrollments
               SET lessons_completed  = $2,
                   progress_percent   = $3,
                   time_spent_minutes = $4,
                   last_accessed_at   = $5,
                   completed_at       = $6
             WHERE id = $1
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(enrollment.id)
        .bind(enrollment.lessons_completed)
        .bind(enrollment.progress_percent)
        .bind(enrollment.time_spent_minutes)
        .bind(enrollment.last_accessed_at)
        .bind(enrollment.completed_at)
        .fetch_one(&mut *tx)
        .await?;

        let certificate = if completed_now {
            issue_if_absent(&mut tx, user_id, course_id).await?
        } else {
            None
        };

        tx.commit().await?;

        if completed_now {
            info!(user_id, course_id, "course completed");
        }
        Ok(Some(ProgressOutcome {
            enrollment,
            certificate,
        }))
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<(Enrollment, Course)>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut ids: Vec<i64> = enrollments.iter().map(|e| e.course_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let courses: HashMap<i64, Course> = self
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(enrollments
            .into_iter()
            .filter_map(|e| courses.get(&e.course_id).cloned().map(|c| (e, c)))
            .collect())
    }
}
