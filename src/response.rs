//! Rendered pages and list pagination.
//!
//! A `Page` is what the template renderer receives: the template name and its context.
//! Responses serialize it as JSON, so the context is observable without an HTML layer.

use crate::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Fixed list page size.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Serialize)]
pub struct Page {
    pub template: String,
    pub context: Value,
}

impl Page {
    pub fn new(template: impl Into<String>, context: Value) -> Self {
        Page {
            template: template.into(),
            context,
        }
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Paginator {
    pub count: i64,
    pub num_pages: u32,
    pub page_size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageObj {
    pub number: u32,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
}

/// The slice of a listing one request renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub paginator: Paginator,
    pub page: PageObj,
}

impl PageWindow {
    pub fn limit(&self) -> u32 {
        self.paginator.page_size
    }

    pub fn offset(&self) -> u32 {
        (self.page.number - 1) * self.paginator.page_size
    }

    pub fn is_paginated(&self) -> bool {
        self.paginator.num_pages > 1
    }
}

/// Resolve the `page` query value against a row count. Absent or blank is page 1,
/// `last` is the final page. An empty listing still has one (empty) page.
pub fn paginate(count: i64, page_size: u32, requested: Option<&str>) -> Result<PageWindow, AppError> {
    let size = i64::from(page_size.max(1));
    let num_pages = if count <= 0 {
        1
    } else {
        u32::try_from((count + size - 1) / size).unwrap_or(u32::MAX)
    };
    let number = match requested.map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some("last") => num_pages,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::NotFound(format!("page '{}' is not 'last', nor an integer", raw)))?,
    };
    if number < 1 || number > num_pages {
        return Err(AppError::NotFound(format!("page {} contains no results", number)));
    }
    Ok(PageWindow {
        paginator: Paginator {
            count: count.max(0),
            num_pages,
            page_size: page_size.max(1),
        },
        page: PageObj {
            number,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then_some(number - 1),
        },
    })
}

/// Context shared by every list page: rows under `list_name` plus pagination blocks.
pub fn list_context<T: Serialize>(list_name: &str, rows: &[T], window: &PageWindow) -> Value {
    let mut ctx = serde_json::Map::new();
    ctx.insert(list_name.to_string(), serde_json::json!(rows));
    ctx.insert("object_list".into(), serde_json::json!(rows));
    ctx.insert("paginator".into(), serde_json::json!(window.paginator));
    ctx.insert("page_obj".into(), serde_json::json!(window.page));
    ctx.insert("is_paginated".into(), Value::Bool(window.is_paginated()));
    Value::Object(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_one_page() {
        let w = paginate(0, PAGE_SIZE, None).unwrap();
        assert_eq!(w.paginator.num_pages, 1);
        assert_eq!((w.limit(), w.offset()), (10, 0));
        assert!(!w.is_paginated());
        assert!(paginate(0, PAGE_SIZE, Some("2")).is_err());
    }

    #[test]
    fn pages_cover_count() {
        let w = paginate(21, PAGE_SIZE, Some("3")).unwrap();
        assert_eq!(w.paginator.num_pages, 3);
        assert_eq!(w.offset(), 20);
        assert!(!w.page.has_next);
        assert_eq!(w.page.previous_page_number, Some(2));
        assert!(w.is_paginated());

        let last = paginate(21, PAGE_SIZE, Some("last")).unwrap();
        assert_eq!(last.page.number, 3);
        assert_eq!(paginate(20, PAGE_SIZE, Some("")).unwrap().page.number, 1);
    }

    #[test]
    fn bad_page_values_are_not_found() {
        for bad in ["0", "4", "-1", "two"] {
            assert!(
                matches!(paginate(21, PAGE_SIZE, Some(bad)), Err(AppError::NotFound(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn list_context_exposes_rows_and_paging() {
        let w = paginate(1, PAGE_SIZE, None).unwrap();
        let ctx = list_context("car_list", &["TT"], &w);
        assert_eq!(ctx["car_list"][0], "TT");
        assert_eq!(ctx["page_obj"]["number"], 1);
        assert_eq!(ctx["is_paginated"], false);
    }
}
