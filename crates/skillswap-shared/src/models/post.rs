use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostImage {
    pub id: Uuid,
    pub image: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostVideo {
    pub id: Uuid,
    pub video: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user: User,
    pub skills: Vec<String>,
    pub wanted_skills: Vec<String>,
    pub availability: Vec<String>,
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub images: Vec<PostImage>,
    #[serde(default)]
    pub videos: Vec<PostVideo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
