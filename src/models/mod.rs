//! Persisted entities and the capability trait the generic CRUD operations use.

mod car;
mod driver;
mod manufacturer;

pub use car::Car;
pub use driver::Driver;
pub use manufacturer::Manufacturer;

use crate::config::EntityDescriptor;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::fmt::Display;

/// A row type backed by a descriptor. Decodes from the descriptor's select list.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Serialize + Display + Send + Unpin + 'static {
    fn descriptor() -> &'static EntityDescriptor;

    fn id(&self) -> i64;
}

/// An option in a select or checkbox list: id plus display string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

impl Choice {
    pub fn of<E: Entity>(e: &E) -> Self {
        Choice {
            id: e.id(),
            label: e.to_string(),
        }
    }
}
