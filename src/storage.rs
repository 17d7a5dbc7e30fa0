//! Local "public" disk used for user uploads.
//!
//! Files are addressed by a path relative to the disk root (for example
//! `avatars/3f1c...png`) and served over HTTP under the configured URL prefix.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::config::StorageConfig;

#[derive(Debug, Clone)]
pub struct PublicDisk {
    root: PathBuf,
    url_prefix: String,
}

impl PublicDisk {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.public_root, &config.public_url)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` at `path`, creating parent directories as needed.
    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(&full, bytes)
            .await
            .with_context(|| format!("Failed to write {}", full.display()))?;

        info!(path = %path, bytes = bytes.len(), "Stored file on public disk");
        Ok(())
    }

    /// Removes the file at `path`. Returns `false` when it was already gone.
    pub async fn delete(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;

        match fs::remove_file(&full).await {
            Ok(()) => {
                info!(path = %path, "Deleted file from public disk");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path, "File already missing from public disk");
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", full.display())),
        }
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    /// Public URL for a stored path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.url_prefix, path.trim_start_matches('/'))
    }

    /// Maps a disk-relative path onto the filesystem, refusing anything that
    /// could escape the disk root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);

        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Invalid storage path: {path:?}");
        }

        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_disk() -> PublicDisk {
        let root = std::env::temp_dir().join(format!("backoffice-disk-{}", uuid::Uuid::new_v4()));
        PublicDisk::new(root, "/storage/")
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let disk = temp_disk();

        disk.put("avatars/a.png", b"png").await.unwrap();
        assert!(disk.exists("avatars/a.png").await.unwrap());

        assert!(disk.delete("avatars/a.png").await.unwrap());
        assert!(!disk.exists("avatars/a.png").await.unwrap());

        // second delete is a no-op
        assert!(!disk.delete("avatars/a.png").await.unwrap());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let disk = temp_disk();
        assert!(disk.resolve("../etc/passwd").is_err());
        assert!(disk.resolve("/etc/passwd").is_err());
        assert!(disk.resolve("avatars/./a.png").is_ok());
        assert!(disk.resolve("").is_err());
    }

    #[test]
    fn test_url() {
        let disk = temp_disk();
        assert_eq!(disk.url("avatars/a.png"), "/storage/avatars/a.png");
    }
}
