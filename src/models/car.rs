use crate::config::{EntityDescriptor, CAR};
use crate::models::{Driver, Entity, Manufacturer};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Car {
    pub id: i64,
    pub model: String,
    pub manufacturer: Manufacturer,
    /// Loaded only for detail pages.
    pub drivers: Vec<Driver>,
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Car {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Car {
            id: row.try_get("id")?,
            model: row.try_get("model")?,
            manufacturer: Manufacturer {
                id: row.try_get("manufacturer_id")?,
                name: row.try_get("manufacturer_name")?,
                country: row.try_get("manufacturer_country")?,
            },
            drivers: Vec::new(),
        })
    }
}

impl Entity for Car {
    fn descriptor() -> &'static EntityDescriptor {
        &CAR
    }

    fn id(&self) -> i64 {
        self.id
    }
}
