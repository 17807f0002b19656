//! Thumbnail storage.
//!
//! Files are addressed by a key of the form `articles/<id>`, derived from the
//! public URL with [`media_key_from_url`]. Backends map the key onto whatever
//! naming they use internally.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use tokio::fs;

const MEDIA_FOLDER: &str = "articles";
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` and return the public URL of the new file.
    async fn upload(&self, file_name: &str, bytes: &Bytes) -> Result<String>;

    /// Remove the file addressed by `key`. Missing files are not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Storage key for a previously returned URL: `articles/<last segment without extension>`.
pub fn media_key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let stem = segment.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{MEDIA_FOLDER}/{stem}"))
}

/// Lowercased extension of an upload, if it is an accepted image type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Stores thumbnails on the local disk; the directory is served under `base_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self) -> PathBuf {
        self.root.join(MEDIA_FOLDER)
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(&self, file_name: &str, bytes: &Bytes) -> Result<String> {
        let Some(extension) = image_extension(file_name) else {
            bail!("unsupported thumbnail type: {file_name}");
        };
        let folder = self.folder();
        fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("failed to create {}", folder.display()))?;

        let stored_name = format!("{}.{extension}", uuid::Uuid::new_v4().simple());
        let path = folder.join(&stored_name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "stored thumbnail");
        Ok(format!("{}/{MEDIA_FOLDER}/{stored_name}", self.base_url))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let Some(stem) = key.strip_prefix(MEDIA_FOLDER).and_then(|rest| rest.strip_prefix('/'))
        else {
            bail!("media key outside of {MEDIA_FOLDER}/: {key}");
        };
        let valid_stem = !stem.is_empty()
            && stem
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid_stem {
            bail!("invalid media key: {key}");
        }

        let folder = self.folder();
        let mut entries = match fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", folder.display()))
            },
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|name| name.to_str()) == Some(stem) {
                fs::remove_file(&path)
                    .await
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                tracing::debug!(path = %path.display(), "removed thumbnail");
            }
        }
        Ok(())
    }
}
