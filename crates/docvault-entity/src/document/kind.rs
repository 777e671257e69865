//! Coarse document content categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content category of a document, guessed from its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// PDF document.
    Pdf,
    /// Raster or vector image.
    Image,
    /// Video file.
    Video,
    /// Office or text document.
    Document,
    /// Anything else.
    Other,
}

impl DocumentKind {
    /// Guess the kind from a filename extension.
    pub fn from_filename(filename: &str) -> Self {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" | "tif" | "tiff" => {
                Self::Image
            }
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "wmv" | "m4v" => Self::Video,
            "doc" | "docx" | "odt" | "rtf" | "txt" | "md" | "xls" | "xlsx" | "ods" | "csv"
            | "ppt" | "pptx" | "odp" => Self::Document,
            _ => Self::Other,
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "document" => Ok(Self::Document),
            "other" => Ok(Self::Other),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid document kind: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        let kind = DocumentKind::from_filename;
        assert_eq!(kind("report.PDF"), DocumentKind::Pdf);
        assert_eq!(kind("photo.jpeg"), DocumentKind::Image);
        assert_eq!(kind("clip.mp4"), DocumentKind::Video);
        assert_eq!(kind("notes.docx"), DocumentKind::Document);
        assert_eq!(kind("archive.tar.gz"), DocumentKind::Other);
        assert_eq!(kind("Makefile"), DocumentKind::Other);
    }
}
