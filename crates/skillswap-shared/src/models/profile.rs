use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user: User,
    pub skills: Vec<String>,
    pub wanted_skills: Vec<String>,
    /// Days of the week.
    pub availability: Vec<String>,
    /// Morning, afternoon, evening.
    pub time_slots: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
