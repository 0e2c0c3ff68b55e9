use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub content: String,
}
