//! In-process blob provider.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, StorageProvider};

/// Blob provider keeping every blob in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageProvider {
    blobs: Arc<DashMap<String, Bytes>>,
}

impl MemoryStorageProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let data = self
            .blobs
            .get(path)
            .map(|b| b.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {path}")))?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, std::io::Error>(data)
        })))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.blobs.insert(path.to_string(), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.blobs.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(path))
    }
}
