//! Entity descriptors: the table, columns and listing rules each generic operation runs against.
//! Identifiers here are the only ones that ever reach generated SQL.

/// One selected column: SQL expression and the name the row decoder reads.
#[derive(Clone, Copy, Debug)]
pub struct ColumnInfo {
    pub expr: &'static str,
    pub alias: &'static str,
}

const fn col(expr: &'static str, alias: &'static str) -> ColumnInfo {
    ColumnInfo { expr, alias }
}

#[derive(Clone, Copy, Debug)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub alias: &'static str,
    /// Human label used in log lines and not-found messages.
    pub label: &'static str,
    /// Context key for the rendered list (`car_list`, ...).
    pub list_name: &'static str,
    pub list_url: &'static str,
    pub template_prefix: &'static str,
    pub columns: &'static [ColumnInfo],
    /// Eager joins; each is appended verbatim after the FROM clause.
    pub joins: &'static [&'static str],
    pub order_by: &'static [&'static str],
    /// Column the list prefix filter applies to, if the entity is searchable.
    pub search_column: Option<&'static str>,
}

impl EntityDescriptor {
    pub fn id_column(&self) -> String {
        format!("{}.id", self.alias)
    }

    pub fn template(&self, suffix: &str) -> String {
        format!("taxi/{}_{}.html", self.template_prefix, suffix)
    }
}

pub const MANUFACTURER: EntityDescriptor = EntityDescriptor {
    table: "taxi_manufacturer",
    alias: "m",
    label: "manufacturer",
    list_name: "manufacturer_list",
    list_url: "/manufacturers/",
    template_prefix: "manufacturer",
    columns: &[col("m.id", "id"), col("m.name", "name"), col("m.country", "country")],
    joins: &[],
    order_by: &["m.name", "m.id"],
    search_column: None,
};

pub const CAR: EntityDescriptor = EntityDescriptor {
    table: "taxi_car",
    alias: "c",
    label: "car",
    list_name: "car_list",
    list_url: "/cars/",
    template_prefix: "car",
    columns: &[
        col("c.id", "id"),
        col("c.model", "model"),
        col("c.manufacturer_id", "manufacturer_id"),
        col("mf.name", "manufacturer_name"),
        col("mf.country", "manufacturer_country"),
    ],
    joins: &["JOIN taxi_manufacturer mf ON mf.id = c.manufacturer_id"],
    order_by: &["c.id"],
    search_column: Some("c.model"),
};

/// Never selects the password hash.
pub const DRIVER: EntityDescriptor = EntityDescriptor {
    table: "taxi_driver",
    alias: "d",
    label: "driver",
    list_name: "driver_list",
    list_url: "/drivers/",
    template_prefix: "driver",
    columns: &[
        col("d.id", "id"),
        col("d.username", "username"),
        col("d.first_name", "first_name"),
        col("d.last_name", "last_name"),
        col("d.license_number", "license_number"),
        col("d.date_joined", "date_joined"),
    ],
    joins: &[],
    order_by: &["d.username", "d.id"],
    search_column: None,
};
