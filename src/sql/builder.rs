//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from entity descriptors.

use crate::config::EntityDescriptor;
use crate::sql::SqlValue;

/// Quote identifier for SQLite (safe: only from descriptors).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) {
        self.params.push(v);
    }
}

fn select_column_list(entity: &EntityDescriptor) -> String {
    entity
        .columns
        .iter()
        .map(|c| format!("{} AS {}", c.expr, quoted(c.alias)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn from_clause(entity: &EntityDescriptor) -> String {
    let mut from = format!("{} {}", quoted(entity.table), entity.alias);
    for join in entity.joins {
        from.push(' ');
        from.push_str(join);
    }
    from
}

fn order_clause(entity: &EntityDescriptor) -> String {
    if entity.order_by.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", entity.order_by.join(", "))
    }
}

/// Case-sensitive "starts with" on the entity's search column. `instr` compares bytes, unlike LIKE.
fn search_clause(entity: &EntityDescriptor, prefix: Option<&str>, q: &mut QueryBuf) -> String {
    match (entity.search_column, prefix.filter(|p| !p.is_empty())) {
        (Some(column), Some(p)) => {
            q.push_param(SqlValue::from(p));
            format!(" WHERE instr({}, ?) = 1", column)
        }
        _ => String::new(),
    }
}

/// SELECT page of rows: optional prefix filter, default ordering, LIMIT/OFFSET.
pub fn select_list(entity: &EntityDescriptor, prefix: Option<&str>, limit: u32, offset: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = search_clause(entity, prefix, &mut q);
    let order = order_clause(entity);
    q.push_param(SqlValue::Int(i64::from(limit)));
    q.push_param(SqlValue::Int(i64::from(offset)));
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?",
        select_column_list(entity),
        from_clause(entity),
        where_clause,
        order
    );
    q
}

/// COUNT(*) with the same filter as `select_list`.
pub fn count(entity: &EntityDescriptor, prefix: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = search_clause(entity, prefix, &mut q);
    q.sql = format!(
        "SELECT COUNT(*) FROM {} {}{}",
        quoted(entity.table),
        entity.alias,
        where_clause
    );
    q
}

/// SELECT one row by primary key.
pub fn select_by_id(entity: &EntityDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(SqlValue::Int(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_column_list(entity),
        from_clause(entity),
        entity.id_column()
    );
    q
}

/// SELECT rows of `entity` linked to any of `owner_ids` through a join table.
/// Each row carries the owning id as `owner_id`.
pub fn select_through(
    entity: &EntityDescriptor,
    join_table: &str,
    entity_key: &str,
    owner_key: &str,
    owner_ids: &[i64],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let placeholders = vec!["?"; owner_ids.len()].join(", ");
    for id in owner_ids {
        q.push_param(SqlValue::Int(*id));
    }
    let mut from = format!(
        "{} j JOIN {} {} ON {} = j.{}",
        quoted(join_table),
        quoted(entity.table),
        entity.alias,
        entity.id_column(),
        quoted(entity_key)
    );
    for join in entity.joins {
        from.push(' ');
        from.push_str(join);
    }
    let order = order_clause(entity);
    q.sql = format!(
        "SELECT j.{} AS \"owner_id\", {} FROM {} WHERE j.{} IN ({}){}",
        quoted(owner_key),
        select_column_list(entity),
        from,
        quoted(owner_key),
        placeholders,
        order
    );
    q
}

/// SELECT 1 when the row exists.
pub fn exists(entity: &EntityDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(SqlValue::Int(id));
    q.sql = format!("SELECT 1 FROM {} WHERE id = ?", quoted(entity.table));
    q
}

/// INSERT returning the new row id.
pub fn insert(entity: &EntityDescriptor, values: Vec<(&'static str, SqlValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols: Vec<String> = values.iter().map(|(c, _)| quoted(c)).collect();
    let placeholders = vec!["?"; values.len()].join(", ");
    for (_, v) in values {
        q.push_param(v);
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        quoted(entity.table),
        cols.join(", "),
        placeholders
    );
    q
}

/// UPDATE the given columns of one row.
pub fn update(entity: &EntityDescriptor, id: i64, values: Vec<(&'static str, SqlValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let sets: Vec<String> = values.iter().map(|(c, _)| format!("{} = ?", quoted(c))).collect();
    for (_, v) in values {
        q.push_param(v);
    }
    q.push_param(SqlValue::Int(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        quoted(entity.table),
        sets.join(", ")
    );
    q
}

/// DELETE one row by primary key.
pub fn delete(entity: &EntityDescriptor, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(SqlValue::Int(id));
    q.sql = format!("DELETE FROM {} WHERE id = ?", quoted(entity.table));
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CAR, MANUFACTURER};

    #[test]
    fn car_list_joins_manufacturer_and_filters_by_prefix() {
        let q = select_list(&CAR, Some("T"), 10, 20);
        assert!(q.sql.contains("JOIN taxi_manufacturer mf ON mf.id = c.manufacturer_id"));
        assert!(q.sql.contains("WHERE instr(c.model, ?) = 1"));
        assert!(q.sql.ends_with("ORDER BY c.id LIMIT ? OFFSET ?"));
        assert_eq!(
            q.params,
            vec![SqlValue::Text("T".into()), SqlValue::Int(10), SqlValue::Int(20)]
        );
    }

    #[test]
    fn empty_prefix_means_no_filter() {
        let q = count(&CAR, Some(""));
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"taxi_car\" c");
        assert!(q.params.is_empty());
    }

    #[test]
    fn prefix_ignored_for_unsearchable_entities() {
        let q = select_list(&MANUFACTURER, Some("Au"), 10, 0);
        assert!(!q.sql.contains("WHERE"));
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn insert_and_update_bind_every_value() {
        let q = insert(
            &MANUFACTURER,
            vec![("name", "Audi".into()), ("country", "Germany".into())],
        );
        assert_eq!(
            q.sql,
            "INSERT INTO \"taxi_manufacturer\" (\"name\", \"country\") VALUES (?, ?) RETURNING id"
        );
        let q = update(&MANUFACTURER, 7, vec![("name", "Audi".into())]);
        assert_eq!(q.sql, "UPDATE \"taxi_manufacturer\" SET \"name\" = ? WHERE id = ?");
        assert_eq!(q.params.last(), Some(&SqlValue::Int(7)));
    }

    #[test]
    fn select_through_tags_owner() {
        let q = select_through(&CAR, "taxi_car_drivers", "car_id", "driver_id", &[4, 5]);
        assert!(q.sql.starts_with("SELECT j.\"driver_id\" AS \"owner_id\", c.id AS \"id\""));
        assert!(q.sql.contains(
            "FROM \"taxi_car_drivers\" j JOIN \"taxi_car\" c ON c.id = j.\"car_id\" JOIN taxi_manufacturer mf"
        ));
        assert!(q.sql.contains("WHERE j.\"driver_id\" IN (?, ?) ORDER BY c.id"));
    }
}
