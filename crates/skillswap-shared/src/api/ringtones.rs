use serde::{Deserialize, Serialize};

use crate::models::Ringtone;

/// Multipart file field carrying the audio.
pub const RINGTONE_FILE_FIELD: &str = "audio_file";

pub const DEFAULT_RINGTONE_NAME: &str = "Custom Ringtone";

#[derive(Debug, Serialize, Deserialize)]
pub struct RingtoneResponse {
    pub message: String,
    pub ringtone: Ringtone,
}
