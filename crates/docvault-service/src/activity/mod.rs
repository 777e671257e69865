//! Activity feeds, statistics and derived favorite state.

pub mod service;

pub use service::{ActivityEntry, ActivityService, Statistics, favorite_state};
