//! Sorting types for list operations.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

impl SortDirection {
    /// Orient an ascending comparison result in this direction.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        assert_eq!(SortDirection::Asc.apply(1.cmp(&2)), Ordering::Less);
        assert_eq!(SortDirection::Desc.apply(1.cmp(&2)), Ordering::Greater);
    }

    #[test]
    fn test_deserialize_lowercase() {
        let dir: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(dir, SortDirection::Asc);
        assert_eq!(SortDirection::default(), SortDirection::Desc);
    }
}
