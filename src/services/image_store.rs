// src/services/image_store.rs
// DOCUMENTATION: Stored image reference release
// PURPOSE: Best-effort cleanup of a deleted place's image

use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

/// Release port for stored image references.
/// Fire-and-forget from the delete path: the caller logs a failure and moves on.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn release(&self, reference: &str) -> anyhow::Result<()>;
}

/// Image store backed by the local uploads directory.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalImageStore { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn release(&self, reference: &str) -> anyhow::Result<()> {
        let path = self.root.join(reference);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("removing {}", path.display()))?;
        log::debug!("Released image {}", path.display());
        Ok(())
    }
}
