//! Access evaluation over owner-plus-grant-list resources.

pub mod evaluator;

pub use evaluator::{authorize, evaluate, require, require_owner, require_owner_or_admin};
