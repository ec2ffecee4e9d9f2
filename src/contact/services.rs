use serde::Deserialize;
use tracing::info;

use super::repo::{ContactMessage, ContactStore, NewContactMessage};
use crate::error::{AppError, AppResult};

pub const DEFAULT_TOPIC: &str = "General";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub message: String,
    pub topic: Option<String>,
    pub company: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Stores the message unread. No email-format check is made.
pub async fn submit(
    contacts: &dyn ContactStore,
    user_id: Option<i64>,
    req: ContactRequest,
) -> AppResult<ContactMessage> {
    let first_name = req.first_name.trim().to_string();
    let email = req.email.trim().to_string();
    let message = req.message.trim().to_string();
    if first_name.is_empty() || email.is_empty() || message.is_empty() {
        return Err(AppError::validation("Please fill all required fields."));
    }

    let stored = contacts
        .insert(NewContactMessage {
            user_id,
            first_name,
            last_name: req.last_name.trim().to_string(),
            email,
            company: non_blank(req.company),
            topic: non_blank(req.topic).unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            message,
        })
        .await?;
    info!(message_id = stored.id, topic = %stored.topic, "contact message stored");
    Ok(stored)
}
