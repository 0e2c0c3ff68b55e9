use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Connection, RelationshipStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct SendConnectionRequest {
    pub to_user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RespondConnectionRequest {
    /// `accept` or `reject`; anything else is rejected by the server.
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RespondConnectionResponse {
    #[serde(flatten)]
    pub connection: Connection,
    pub message: String,
    pub sender_name: String,
    pub accepter_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionStatusResponse {
    pub status: RelationshipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sender: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisconnectResponse {
    pub message: String,
    pub user_name: String,
}
