//! HTTP handlers: one per (entity, operation), plus dashboard and account pages.

pub mod account;
pub mod car;
pub mod driver;
pub mod index;
pub mod manufacturer;

use crate::error::{AppError, FormErrors};
use crate::models::Entity;
use crate::response::{paginate, PageWindow, PAGE_SIZE};
use crate::service::{CrudService, Session};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Path ids that are not integers name no row.
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound(format!("no object with id '{}'", raw)))
}

/// Count, resolve the requested page, fetch that page.
pub(crate) async fn list_page<E: Entity>(
    pool: &SqlitePool,
    prefix: Option<&str>,
    page: Option<&str>,
) -> Result<(Vec<E>, PageWindow), AppError> {
    let count = CrudService::count::<E>(pool, prefix).await?;
    let window = paginate(count, PAGE_SIZE, page)?;
    let rows = CrudService::list::<E>(pool, prefix, window.limit(), window.offset()).await?;
    Ok((rows, window))
}

/// `{ "form": { "data": ..., "errors": ... } }`, the shape every form page renders.
pub(crate) fn form_context<T: Serialize>(data: &T, errors: &FormErrors) -> Value {
    json!({
        "form": {
            "data": data,
            "errors": errors,
            "is_bound": !errors.is_empty(),
        }
    })
}

/// Add `key: value` to an object context.
pub(crate) fn with(mut ctx: Value, key: &str, value: Value) -> Value {
    if let Value::Object(map) = &mut ctx {
        map.insert(key.to_string(), value);
    }
    ctx
}

/// Expose the logged-in user (or null) to templates.
pub(crate) fn with_user(ctx: Value, session: Option<&Session>) -> Value {
    let user = session.map(|s| json!({ "id": s.driver_id, "username": s.username }));
    with(ctx, "user", user.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for bad in ["0", "-3", "abc", ""] {
            assert!(matches!(parse_id(bad), Err(AppError::NotFound(_))));
        }
    }

    #[test]
    fn form_context_carries_data_and_errors() {
        let mut errors = FormErrors::new();
        errors.add("name", ValidationError::MissingField);
        let ctx = form_context(&json!({"country": "Japan"}), &errors);
        assert_eq!(ctx["form"]["data"]["country"], "Japan");
        assert_eq!(ctx["form"]["errors"]["name"][0]["code"], "missing_field");
        let ctx = with(ctx, "object", json!(1));
        assert_eq!(ctx["object"], 1);
    }
}
