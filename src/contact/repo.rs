use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::{error::AppResult, store::PgStore};

/// Inbound inquiry from the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub topic: String,
    pub message: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub user_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
    pub topic: String,
    pub message: String,
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, msg: NewContactMessage) -> AppResult<ContactMessage>;
}

#[async_trait]
impl ContactStore for PgStore {
    async fn insert(&self, msg: NewContactMessage) -> AppResult<ContactMessage> {
        let row = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (user_id, first_name, last_name, email, company, topic, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, first_name, last_name, email, company, topic, message, is_read, created_at
            "#,
        )
        .bind(msg.user_id)
        .bind(&msg.first_name)
        .bind(&msg.last_name)
        .bind(&msg.email)
        .bind(&msg.company)
        .bind(&msg.topic)
        .bind(&msg.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
