//! # docvault-auth
//!
//! Authorization and account recovery for DocVault.
//!
//! ## Modules
//!
//! - `acl` - pure access evaluation over owner + embedded grant lists
//! - `reset` - single-use password reset codes

pub mod acl;
pub mod reset;

pub use acl::{authorize, evaluate, require, require_owner, require_owner_or_admin};
pub use reset::PasswordResetService;
