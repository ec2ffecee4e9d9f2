use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, Transaction};
use time::OffsetDateTime;

use super::services::generate_code;
use crate::{
    error::{conflict_on_unique, AppResult},
    store::PgStore,
};

pub const CODE_COLLISION: &str = "Certificate code collision.";

/// Proof of completion, one per (user, course).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub certificate_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

/// Certificate as listed to its owner.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CertificateView {
    pub id: i64,
    pub course_title: Option<String>,
    pub certificate_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<CertificateView>>;
}

/// Issues the certificate inside the completion transaction.
/// Returns `None` when the pair already held one; a code collision fails with `Conflict`.
pub async fn issue_if_absent(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    course_id: i64,
) -> AppResult<Option<Certificate>> {
    sqlx::query_as::<_, Certificate>(
        r#"
        INSERT INTO certificates (user_id, course_id, certificate_code)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, course_id) DO NOTHING
        RETURNING id, user_id, course_id, certificate_code, issued_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(generate_code())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| conflict_on_unique(e, CODE_COLLISION))
}

#[async_trait]
impl CertificateStore for PgStore {
    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<CertificateView>> {
        let rows = sqlx::query_as::<_, CertificateView>(
            r#"
            SELECT c.id, co.title AS course_title, c.certificate_code, c.issued_at
              FROM certificates c
              LEFT JOIN courses co ON co.id = c.course_id
             WHERE c.user_id = $1
             ORDER BY c.issued_at ASC, c.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
