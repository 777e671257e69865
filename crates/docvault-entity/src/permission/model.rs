//! Permission entry value object and the access-controlled resource trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::id::UserId;

use super::level::AccessLevel;

/// A grant of an access level to one user on one resource.
///
/// A resource holds at most one entry per grantee, and never one for its
/// owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// The grantee.
    pub user_id: UserId,
    /// Granted level.
    pub access_level: AccessLevel,
    /// When the grant was created or last replaced.
    pub granted_at: DateTime<Utc>,
    /// The user who created the grant.
    pub granted_by: UserId,
}

/// A resource carrying an owner and an embedded permission list.
pub trait AccessControlled {
    /// Human-readable resource label used in messages.
    const LABEL: &'static str;

    /// The sole identity with unconditional full control.
    fn owner_id(&self) -> UserId;

    /// The embedded grant list, in grant order.
    fn permissions(&self) -> &[PermissionEntry];

    /// The grant held by `user_id`, if any.
    fn permission_for(&self, user_id: UserId) -> Option<&PermissionEntry> {
        self.permissions().iter().find(|p| p.user_id == user_id)
    }

    /// Whether `user_id` owns this resource.
    fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id() == user_id
    }
}
