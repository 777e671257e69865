//! Single-use password reset codes.

pub mod service;

pub use service::PasswordResetService;
