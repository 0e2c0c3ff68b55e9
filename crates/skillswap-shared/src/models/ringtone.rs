use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ringtone {
    pub id: Uuid,
    pub name: String,
    pub audio_file: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
