//! Access level enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Graded access level of a grant.
///
/// Ordered by privilege: View < Edit < Admin. The owner of a resource is
/// always evaluated as `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only access.
    View,
    /// Can modify content, metadata, versions and comments.
    Edit,
    /// Can additionally manage grants and trash folders.
    Admin,
}

impl AccessLevel {
    /// Check if this level grants at least the given level.
    pub fn has_at_least(&self, required: AccessLevel) -> bool {
        *self >= required
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = docvault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            "admin" => Ok(Self::Admin),
            _ => Err(docvault_core::AppError::validation(format!(
                "Invalid access level: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(AccessLevel::View < AccessLevel::Edit);
        assert!(AccessLevel::Edit < AccessLevel::Admin);
        assert!(AccessLevel::Admin.has_at_least(AccessLevel::View));
        assert!(!AccessLevel::View.has_at_least(AccessLevel::Edit));
    }

    #[test]
    fn test_parse() {
        assert_eq!("EDIT".parse::<AccessLevel>().unwrap(), AccessLevel::Edit);
        let err = "owner".parse::<AccessLevel>().unwrap_err();
        assert_eq!(err.kind, docvault_core::error::ErrorKind::Validation);
    }
}
