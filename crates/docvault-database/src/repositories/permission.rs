//! Embedded permission list patch operations shared by documents and
//! folders.

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_core::types::id::UserId;
use docvault_entity::permission::PermissionEntry;

/// Replace the grantee's entry in place, or append a new one.
///
/// On replacement only the level and grant time change; the original
/// grantor is kept.
pub fn upsert_entry(list: &mut Vec<PermissionEntry>, entry: PermissionEntry) {
    match list.iter_mut().find(|p| p.user_id == entry.user_id) {
        Some(existing) => {
            existing.access_level = entry.access_level;
            existing.granted_at = entry.granted_at;
        }
        None => list.push(entry),
    }
}

/// Remove the grantee's entry. A missing entry is an error and leaves the
/// list unchanged.
pub fn pull_entry(list: &mut Vec<PermissionEntry>, user_id: UserId) -> AppResult<PermissionEntry> {
    let idx = list
        .iter()
        .position(|p| p.user_id == user_id)
        .ok_or_else(|| AppError::not_found("User does not have access"))?;
    Ok(list.remove(idx))
}
