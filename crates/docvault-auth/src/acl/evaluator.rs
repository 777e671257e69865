//! Pure access decisions for documents and folders.
//!
//! Nothing here performs I/O or caches: every call re-reads the owner and
//! the embedded grant list of the resource it is given.

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_entity::permission::{AccessControlled, AccessLevel};

/// Effective level of `actor` on `resource`: `Admin` for the owner,
/// otherwise the level of the actor's grant, otherwise `None`.
pub fn evaluate<R: AccessControlled>(actor: UserId, resource: &R) -> Option<AccessLevel> {
    if resource.is_owned_by(actor) {
        return Some(AccessLevel::Admin);
    }
    resource.permission_for(actor).map(|p| p.access_level)
}

/// Whether `actor` holds at least `required` on `resource`.
pub fn authorize<R: AccessControlled>(
    actor: UserId,
    resource: &R,
    required: AccessLevel,
) -> bool {
    evaluate(actor, resource).is_some_and(|level| level.has_at_least(required))
}

/// Like [`authorize`], failing with `Forbidden` and returning the level.
pub fn require<R: AccessControlled>(
    actor: UserId,
    resource: &R,
    required: AccessLevel,
) -> AppResult<AccessLevel> {
    match evaluate(actor, resource) {
        Some(level) if level.has_at_least(required) => Ok(level),
        _ => Err(AppError::forbidden(format!(
            "{} requires {required} access",
            R::LABEL
        ))),
    }
}

/// Fail with `Forbidden` unless `actor` owns `resource`.
pub fn require_owner<R: AccessControlled>(actor: UserId, resource: &R) -> AppResult<()> {
    if resource.is_owned_by(actor) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Only the owner can perform this action on the {}",
            R::LABEL.to_lowercase()
        )))
    }
}

/// Fail with `Forbidden` unless `actor` owns `resource` or holds an admin
/// grant on it.
pub fn require_owner_or_admin<R: AccessControlled>(
    actor: UserId,
    resource: &R,
) -> AppResult<()> {
    require(actor, resource, AccessLevel::Admin).map(|_| ())
}
