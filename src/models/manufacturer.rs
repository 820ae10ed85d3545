use crate::config::{EntityDescriptor, MANUFACTURER};
use crate::models::Entity;
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub country: String,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

impl Entity for Manufacturer {
    fn descriptor() -> &'static EntityDescriptor {
        &MANUFACTURER
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_name_and_country() {
        let m = Manufacturer {
            id: 1,
            name: "Ford".into(),
            country: "USA".into(),
        };
        assert_eq!(m.to_string(), "Ford USA");
    }
}
