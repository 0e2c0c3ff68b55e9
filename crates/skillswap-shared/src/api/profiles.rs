use serde::{Deserialize, Serialize};

/// Body of both profile creation and partial update; absent lists are left
/// untouched on update and default to empty on creation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wanted_skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slots: Option<Vec<String>>,
}
