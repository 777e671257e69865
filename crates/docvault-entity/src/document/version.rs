//! Document version entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::{UserId, VersionId};

/// One entry of a document's append-only version chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Unique version identifier.
    pub id: VersionId,
    /// Sequential version number, starting at 1.
    pub version_number: u32,
    /// Blob reference of this version's content.
    pub storage_ref: String,
    /// Size in bytes.
    pub size: u64,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
    /// User who created this version.
    pub created_by: UserId,
}

impl DocumentVersion {
    /// Create a new version entry.
    pub fn new(
        version_number: u32,
        storage_ref: impl Into<String>,
        size: u64,
        created_by: UserId,
    ) -> Self {
        Self {
            id: VersionId::new(),
            version_number,
            storage_ref: storage_ref.into(),
            size,
            created_at: Utc::now(),
            created_by,
        }
    }

    /// Download filename for this version: `{stem}_v{n}{ext}`.
    pub fn download_filename(&self, original_filename: &str) -> String {
        let path = std::path::Path::new(original_filename);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(original_filename);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_v{}.{ext}", self.version_number),
            None => format!("{stem}_v{}", self.version_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        let v = DocumentVersion::new(3, "abc.pdf", 10, UserId::new());
        assert_eq!(v.download_filename("report.pdf"), "report_v3.pdf");
        assert_eq!(v.download_filename("README"), "README_v3");
        assert_eq!(v.download_filename("a.tar.gz"), "a.tar_v3.gz");
    }
}
