//! Local filesystem storage for uploaded media.
//!
//! Files are written under the configured root in one directory per kind and
//! are referenced from the database by their path relative to that root. The
//! router serves the root at `/media`, so a stored path maps to
//! `{public_base_url}/media/{path}`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    ProfileImage,
    PostImage,
    PostVideo,
    Ringtone,
}

impl MediaKind {
    fn dir(self) -> &'static str {
        match self {
            MediaKind::ProfileImage => "profile_images",
            MediaKind::PostImage => "post_images",
            MediaKind::PostVideo => "post_videos",
            MediaKind::Ringtone => "ringtones",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for a stored relative path.
    pub fn url(&self, relative: &str) -> String {
        format!("{}/media/{}", self.base_url, relative)
    }

    /// Write `bytes` under a fresh name and return the relative path.
    pub async fn save(
        &self,
        kind: MediaKind,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let relative = relative_path(kind, original_name);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored media file");
        Ok(relative)
    }

    /// Remove a stored file. Failures are logged and otherwise ignored.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove media file");
        }
    }
}

fn relative_path(kind: MediaKind, original_name: Option<&str>) -> String {
    let name = Uuid::new_v4().simple().to_string();
    match original_name.and_then(sanitized_extension) {
        Some(ext) => format!("{}/{}.{}", kind.dir(), name, ext),
        None => format!("{}/{}", kind.dir(), name),
    }
}

fn sanitized_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_clean_extension_only() {
        assert_eq!(sanitized_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(sanitized_extension("clip.tar.gz").as_deref(), Some("gz"));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension("evil.p/hp"), None);
        assert_eq!(sanitized_extension("weird.mp3?x=1"), None);
    }

    #[test]
    fn relative_path_lands_in_kind_directory() {
        let path = relative_path(MediaKind::PostVideo, Some("../../etc/passwd.mp4"));
        assert!(path.starts_with("post_videos/"));
        assert!(path.ends_with(".mp4"));
        assert!(!path.contains(".."));
    }

    #[test]
    fn url_joins_base_and_media_prefix() {
        let store = MediaStore::new("/tmp/media", "http://example.com/");
        assert_eq!(
            store.url("post_images/abc.png"),
            "http://example.com/media/post_images/abc.png"
        );
    }

    #[tokio::test]
    async fn save_and_remove_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "http://localhost");

        let relative = store
            .save(MediaKind::Ringtone, Some("ring.mp3"), b"ID3")
            .await
            .unwrap();
        let on_disk = dir.path().join(&relative);
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"ID3");

        store.remove(&relative).await;
        assert!(!on_disk.exists());
    }
}
