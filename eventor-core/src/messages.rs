use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{require_text, CoreError, CoreResult};

pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub booking_id: Option<i64>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub recipient_id: i64,
    pub booking_id: Option<i64>,
    pub content: String,
}

impl NewMessage {
    pub fn new(sender_id: i64, recipient_id: i64, booking_id: Option<i64>, content: &str) -> CoreResult<Self> {
        if sender_id == recipient_id {
            return Err(CoreError::validation("You cannot message yourself"));
        }
        let content = require_text("content", content)?;
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(CoreError::validation(format!(
                "Messages are limited to {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        Ok(Self { sender_id, recipient_id, booking_id, content })
    }
}
