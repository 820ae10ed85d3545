//! Request extractors.

pub mod identity;
pub use identity::{CurrentUser, MaybeUser, SESSION_COOKIE};
