//! Document blob store: naming, size limits and best-effort cleanup on top
//! of a [`StorageProvider`].

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use docvault_core::config::storage::StorageConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, StorageProvider};

use crate::providers::LocalStorageProvider;

/// Reference and size of a freshly written blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Opaque reference to pass back to the store.
    pub storage_ref: String,
    /// Size in bytes.
    pub size: u64,
}

/// Writes, reads and deletes document blobs.
#[derive(Debug, Clone)]
pub struct BlobStore {
    provider: Arc<dyn StorageProvider>,
    max_upload_size: u64,
}

impl BlobStore {
    /// Wrap a provider with an upload size limit.
    pub fn new(provider: Arc<dyn StorageProvider>, max_upload_size: u64) -> Self {
        Self {
            provider,
            max_upload_size,
        }
    }

    /// Build a store over the local filesystem root from configuration.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let provider = LocalStorageProvider::new(&config.root_path).await?;
        Ok(Self::new(Arc::new(provider), config.max_upload_size_bytes))
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// Store a fully buffered body under a fresh unique name keeping the
    /// extension of `filename`.
    pub async fn put(&self, data: Bytes, filename: &str) -> AppResult<StoredBlob> {
        let size = data.len() as u64;
        if size > self.max_upload_size {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_upload_size
            )));
        }
        let storage_ref = blob_name(filename);
        self.provider.write(&storage_ref, data).await?;
        debug!(storage_ref = %storage_ref, size, "Stored blob");
        Ok(StoredBlob { storage_ref, size })
    }

    /// Stream a blob. A missing blob is reported as unavailable.
    pub async fn open(&self, storage_ref: &str) -> AppResult<ByteStream> {
        self.provider
            .read(storage_ref)
            .await
            .map_err(|e| missing_as_unavailable(storage_ref, e))
    }

    /// Collect a whole blob from its stream. A missing blob is reported as
    /// unavailable.
    pub async fn fetch(&self, storage_ref: &str) -> AppResult<Bytes> {
        let mut stream = self.open(storage_ref).await?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Delete a blob.
    pub async fn remove(&self, storage_ref: &str) -> AppResult<()> {
        self.provider.delete(storage_ref).await
    }

    /// Delete every blob in `refs`, logging and skipping failures.
    ///
    /// Returns the number of blobs that could not be removed.
    pub async fn remove_all_best_effort(&self, refs: &[String]) -> usize {
        let mut failures = 0;
        for storage_ref in refs {
            if let Err(e) = self.provider.delete(storage_ref).await {
                failures += 1;
                warn!(storage_ref = %storage_ref, error = %e, "Failed to delete blob, skipping");
            }
        }
        failures
    }
}

fn missing_as_unavailable(storage_ref: &str, err: AppError) -> AppError {
    if err.is(ErrorKind::NotFound) {
        AppError::unavailable(format!("Content for {storage_ref} is missing from storage"))
    } else {
        err
    }
}

/// `{uuid}{ext}` where `ext` is the lowercase extension of `filename`.
fn blob_name(filename: &str) -> String {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
    format!("{}{ext}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryStorageProvider;
    use futures::TryStreamExt;

    #[test]
    fn test_blob_name_keeps_extension() {
        let a = blob_name("Quarterly Report.PDF");
        let b = blob_name("Quarterly Report.PDF");
        assert!(a.ends_with(".pdf"));
        assert_ne!(a, b);
        assert!(!blob_name("README").contains('.'));
    }

    #[tokio::test]
    async fn test_put_fetch_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::from_config(&StorageConfig {
            root_path: dir.path().display().to_string(),
            max_upload_size_bytes: 1024,
        })
        .await
        .unwrap();

        let blob = store
            .put(Bytes::from("v1 body"), "notes.txt")
            .await
            .unwrap();
        assert_eq!(blob.size, 7);
        let fetched = store.fetch(&blob.storage_ref).await.unwrap();
        assert_eq!(fetched, Bytes::from("v1 body"));

        store.remove(&blob.storage_ref).await.unwrap();
        let err = store.fetch(&blob.storage_ref).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_open_streams_and_reports_missing() {
        let store = BlobStore::new(Arc::new(MemoryStorageProvider::new()), 1024);
        let blob = store.put(Bytes::from("streamed"), "a.txt").await.unwrap();

        let chunks: Vec<Bytes> = store
            .open(&blob.storage_ref)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"streamed".to_vec());

        store.remove(&blob.storage_ref).await.unwrap();
        let err = match store.open(&blob.storage_ref).await {
            Ok(_) => panic!("removed blob still opens"),
            Err(e) => e,
        };
        assert_eq!(err.kind, ErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn test_size_limit() {
        let store = BlobStore::new(Arc::new(MemoryStorageProvider::new()), 4);
        let err = store.put(Bytes::from("12345"), "a.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_best_effort_removal_skips_bad_refs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let provider = LocalStorageProvider::new(root).await.unwrap();
        let store = BlobStore::new(Arc::new(provider), 1024);
        let blob = store.put(Bytes::from("x"), "a.txt").await.unwrap();
        let failures = store
            .remove_all_best_effort(&[blob.storage_ref.clone(), "../outside".to_string()])
            .await;
        assert_eq!(failures, 1);
        assert!(!store.provider().exists(&blob.storage_ref).await.unwrap());
    }
}
