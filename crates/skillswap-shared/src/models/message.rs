use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: User,
    pub receiver: User,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// One entry of the conversation list: the peer, the latest message exchanged
/// in either direction and how many of the peer's messages are still unread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub user: User,
    pub last_message: Message,
    pub unread_count: i64,
}
