//! Normalized inbound boundary: tagged operations in, [`Outcome`]s out.
//!
//! [`Outcome`]: docvault_core::types::Outcome

pub mod dispatcher;
pub mod operation;

pub use dispatcher::Dispatcher;
pub use operation::Operation;
