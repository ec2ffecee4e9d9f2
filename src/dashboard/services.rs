use serde::Serialize;

use crate::{
    certificates::repo::{CertificateStore, CertificateView},
    enrollments::{dto::EnrollmentView, repo::EnrollmentStore, services as enrollment_services},
    error::AppResult,
};

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub courses_enrolled: usize,
    pub courses_completed: usize,
    pub certificates_earned: usize,
    pub total_hours: f64,
    pub enrollments: Vec<EnrollmentView>,
    pub certificates: Vec<CertificateView>,
}

/// Minutes to hours, one decimal, ties to even.
pub fn minutes_to_hours(total_minutes: i64) -> f64 {
    (total_minutes as f64 / 60.0 * 10.0).round_ties_even() / 10.0
}

pub async fn stats(
    enrollments: &dyn EnrollmentStore,
    certificates: &dyn CertificateStore,
    user_id: i64,
) -> AppResult<DashboardStats> {
    let enrollments = enrollment_services::list_for_user(enrollments, user_id).await?;
    let certificates = certificates.list_for_user(user_id).await?;

    let total_minutes: i64 = enrollments
        .iter()
        .map(|e| i64::from(e.time_spent_minutes))
        .sum();
    let courses_completed = enrollments
        .iter()
        .filter(|e| e.completed_at.is_some())
        .count();

    Ok(DashboardStats {
        courses_enrolled: enrollments.len(),
        courses_completed,
        certificates_earned: certificates.len(),
        total_hours: minutes_to_hours(total_minutes),
        enrollments,
        certificates,
    })
}
