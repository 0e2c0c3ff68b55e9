use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// The recipient's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Accept,
    Reject,
}

impl ConnectionAction {
    pub fn resulting_status(self) -> ConnectionStatus {
        match self {
            Self::Accept => ConnectionStatus::Accepted,
            Self::Reject => ConnectionStatus::Rejected,
        }
    }

    /// Past tense used in human-readable responses.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Accept => "accepted",
            Self::Reject => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown connection action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ConnectionAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Relationship between a viewer and another user, including the absence of
/// any connection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    None,
    Pending,
    Accepted,
    Rejected,
}

impl From<ConnectionStatus> for RelationshipStatus {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Pending => Self::Pending,
            ConnectionStatus::Accepted => Self::Accepted,
            ConnectionStatus::Rejected => Self::Rejected,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: Uuid,
    pub from_user: User,
    pub to_user: User,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
