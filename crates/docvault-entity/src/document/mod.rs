//! Document aggregate and its owned value objects.

pub mod activity;
pub mod comment;
pub mod kind;
pub mod model;
pub mod version;

pub use activity::{Activity, ActivityAction};
pub use comment::Comment;
pub use kind::DocumentKind;
pub use model::{CreateDocument, Document};
pub use version::DocumentVersion;
