//! Content store backed by a local directory, one file per blob.

use crate::traits::ContentStore;
use crate::{content_ref_for, CollabError, CollabResult};
use async_trait::async_trait;
use sault_types::ContentRef;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Blobs live at `<root>/<content-ref>`; writing the same bytes twice is a no-op.
#[derive(Debug, Clone)]
pub struct DirectoryContentStore {
    root: PathBuf,
}

impl DirectoryContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, content_ref: &ContentRef) -> CollabResult<PathBuf> {
        let name = content_ref.as_str();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CollabError::Invalid(format!(
                "content reference {:?} is not a valid blob name",
                name
            )));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ContentStore for DirectoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> CollabResult<ContentRef> {
        let content_ref = content_ref_for(&bytes);
        let path = self.blob_path(&content_ref)?;
        if tokio::fs::try_exists(&path).await? {
            return Ok(content_ref);
        }
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, &bytes).await?;
        debug!(content_ref = %content_ref, size = bytes.len(), "Stored blob");
        Ok(content_ref)
    }

    async fn get(&self, content_ref: &ContentRef) -> CollabResult<Vec<u8>> {
        let path = self.blob_path(content_ref)?;
        Ok(tokio::fs::read(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryContentStore::new(dir.path().join("blobs"));

        let cid = store.put(b"rental contract".to_vec()).await.unwrap();
        assert!(dir.path().join("blobs").join(cid.as_str()).exists());
        assert_eq!(store.get(&cid).await.unwrap(), b"rental contract".to_vec());
    }

    #[tokio::test]
    async fn test_missing_and_invalid_refs() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryContentStore::new(dir.path());

        let missing = store.get(&ContentRef::new("abc123")).await;
        assert!(matches!(missing, Err(CollabError::NotFound(_))));

        let traversal = store.get(&ContentRef::new("../etc/passwd")).await;
        assert!(matches!(traversal, Err(CollabError::Invalid(_))));
    }
}
