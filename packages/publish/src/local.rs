//! Local-directory sink.
//!
//! Copies artifacts into a directory (e.g. one served by a static web
//! server) and returns `file://` URLs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{ArtifactSink, PublishError, Published};

/// Publishes artifacts by copying them into `dir`.
pub struct LocalSink {
    dir: PathBuf,
}

impl LocalSink {
    /// Creates a sink that copies into `dir`, creating it on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn url(&self, name: &str) -> String {
        let target = self.dir.join(name);
        let absolute = std::path::absolute(&target).unwrap_or(target);
        format!("file://{}", absolute.display())
    }
}

#[async_trait]
impl ArtifactSink for LocalSink {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    async fn publish(&self, local_path: &Path, name: &str) -> Result<Published, PublishError> {
        if !local_path.exists() {
            return Err(PublishError::MissingArtifact {
                path: local_path.to_path_buf(),
            });
        }

        let data = tokio::fs::read(local_path).await?;
        let target = self.dir.join(name);

        let unchanged = tokio::fs::read(&target)
            .await
            .is_ok_and(|existing| existing == data);
        if !unchanged {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, &data).await?;
            log::debug!("Copied {} -> {}", local_path.display(), target.display());
        }

        Ok(Published {
            url: self.url(name),
            unchanged,
        })
    }
}
