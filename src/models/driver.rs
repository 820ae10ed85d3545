use crate::config::{EntityDescriptor, DRIVER};
use crate::models::{Car, Entity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A staff member who can log in and drive cars. The password hash is never loaded here.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Driver {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: Option<String>,
    pub date_joined: DateTime<Utc>,
    /// Cars driven, with manufacturers. Filled by the list and detail loaders.
    #[sqlx(skip)]
    pub cars: Vec<Car>,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}

impl Entity for Driver {
    fn descriptor() -> &'static EntityDescriptor {
        &DRIVER
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_username_and_full_name() {
        let d = Driver {
            id: 1,
            username: "driver".into(),
            first_name: "Driver1".into(),
            last_name: "Driver2".into(),
            license_number: None,
            date_joined: Utc::now(),
            cars: Vec::new(),
        };
        assert_eq!(d.to_string(), "driver (Driver1 Driver2)");
    }
}
