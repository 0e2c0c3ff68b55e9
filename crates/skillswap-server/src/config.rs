use std::env;
use std::path::PathBuf;

use anyhow::Context;

/// Largest accepted ringtone upload.
pub const MAX_RINGTONE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
    pub port: u16,
    pub media_root: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://skillswap.db".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expires_in: env::var("JWT_EXPIRES_IN")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .context("JWT_EXPIRES_IN must be a number of seconds")?,
            port,
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "104857600".to_string()) // 100 MiB
                .parse()
                .context("MAX_UPLOAD_BYTES must be a number of bytes")?,
        })
    }

    /// Configuration for tests and local tooling, rooted at `media_root`.
    pub fn test_default(media_root: impl Into<PathBuf>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-do-not-use-in-production".to_string(),
            jwt_expires_in: 3600,
            port: 0,
            media_root: media_root.into(),
            public_base_url: "http://testserver".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}
