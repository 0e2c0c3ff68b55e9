mod auth;
mod connections;
mod messages;
mod posts;
mod profiles;
mod ringtones;

pub use auth::*;
pub use connections::*;
pub use messages::*;
pub use posts::*;
pub use profiles::*;
pub use ringtones::*;

use serde::{Deserialize, Serialize};

/// Body of responses that only carry a human-readable confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
