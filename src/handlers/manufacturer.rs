//! Manufacturer list, create, update, delete.

use crate::config::MANUFACTURER;
use crate::error::{AppError, FormErrors};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::handlers::{form_context, list_page, parse_id, with, with_user, PageQuery};
use crate::models::Manufacturer;
use crate::response::{list_context, Page};
use crate::service::validation::{validate_manufacturer, ManufacturerForm};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde_json::json;

/// Public: anonymous callers may list manufacturers.
pub async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Page, AppError> {
    let (rows, window) = list_page::<Manufacturer>(&state.pool, None, query.page.as_deref()).await?;
    let ctx = list_context(MANUFACTURER.list_name, &rows, &window);
    Ok(Page::new(MANUFACTURER.template("list"), with_user(ctx, user.as_ref())))
}

pub async fn create_form(CurrentUser(user): CurrentUser) -> Page {
    let ctx = form_context(&ManufacturerForm::default(), &FormErrors::new());
    Page::new(MANUFACTURER.template("form"), with_user(ctx, Some(&user)))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response, AppError> {
    match validate_manufacturer(&form) {
        Ok(fields) => {
            CrudService::insert_manufacturer(&state.pool, &fields).await?;
            Ok(Redirect::to(MANUFACTURER.list_url).into_response())
        }
        Err(errors) => {
            let ctx = form_context(&form, &errors);
            Ok(Page::new(MANUFACTURER.template("form"), with_user(ctx, Some(&user))).into_response())
        }
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let m: Manufacturer = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let data = ManufacturerForm {
        name: Some(m.name.clone()),
        country: Some(m.country.clone()),
    };
    let ctx = with(form_context(&data, &FormErrors::new()), "object", json!(m));
    Ok(Page::new(MANUFACTURER.template("form"), with_user(ctx, Some(&user))))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response, AppError> {
    let m: Manufacturer = CrudService::get(&state.pool, parse_id(&id)?).await?;
    match validate_manufacturer(&form) {
        Ok(fields) => {
            if !CrudService::update_manufacturer(&state.pool, m.id, &fields).await? {
                return Err(AppError::NotFound(format!("manufacturer {}", m.id)));
            }
            Ok(Redirect::to(MANUFACTURER.list_url).into_response())
        }
        Err(errors) => {
            let ctx = with(form_context(&form, &errors), "object", json!(m));
            Ok(Page::new(MANUFACTURER.template("form"), with_user(ctx, Some(&user))).into_response())
        }
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let m: Manufacturer = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let ctx = json!({ "object": m, "manufacturer": m });
    Ok(Page::new(MANUFACTURER.template("confirm_delete"), with_user(ctx, Some(&user))))
}

/// Cars of the manufacturer go with it.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    if !CrudService::delete::<Manufacturer>(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("manufacturer {}", id)));
    }
    Ok(Redirect::to(MANUFACTURER.list_url))
}
