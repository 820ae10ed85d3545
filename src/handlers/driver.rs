//! Driver list, detail, signup-style create, license-only update, delete.

use crate::config::DRIVER;
use crate::error::{AppError, FormErrors, ValidationError};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::handlers::{form_context, list_page, parse_id, with, with_user, PageQuery};
use crate::models::Driver;
use crate::response::{list_context, Page};
use crate::service::password::hash_password;
use crate::service::validation::{
    license_taken, validate_driver_create, validate_driver_update, DriverCreateEcho, DriverCreateForm,
    DriverUpdateForm,
};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde_json::json;

/// Public: anonymous callers may list drivers. Cars and their manufacturers are loaded with the page.
pub async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Page, AppError> {
    let (mut rows, window) = list_page::<Driver>(&state.pool, None, query.page.as_deref()).await?;
    CrudService::load_cars_for(&state.pool, &mut rows).await?;
    let ctx = list_context(DRIVER.list_name, &rows, &window);
    Ok(Page::new(DRIVER.template("list"), with_user(ctx, user.as_ref())))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let driver: Driver = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let mut one = [driver];
    CrudService::load_cars_for(&state.pool, &mut one).await?;
    let [driver] = one;
    let ctx = json!({ "object": driver, "driver": driver });
    Ok(Page::new(DRIVER.template("detail"), with_user(ctx, Some(&user))))
}

fn empty_create_echo() -> DriverCreateEcho {
    DriverCreateForm::default().echo()
}

pub async fn create_form(CurrentUser(user): CurrentUser) -> Page {
    let ctx = form_context(&empty_create_echo(), &FormErrors::new());
    Page::new(DRIVER.template("form"), with_user(ctx, Some(&user)))
}

/// Passwords are never echoed back into a redisplayed form.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<DriverCreateForm>,
) -> Result<Response, AppError> {
    let redisplay = |errors: &FormErrors| {
        let ctx = form_context(&form.echo(), errors);
        Page::new(DRIVER.template("form"), with_user(ctx, Some(&user))).into_response()
    };
    let driver = match validate_driver_create(&state.pool, &form).await? {
        Ok(d) => d,
        Err(errors) => return Ok(redisplay(&errors)),
    };
    let hash = hash_password(&driver.password);
    match CrudService::insert_driver(&state.pool, &driver, &hash).await {
        Ok(_) => Ok(Redirect::to(DRIVER.list_url).into_response()),
        Err(e) if e.is_unique_violation() => {
            // Another request took the username or license between validation and insert.
            let mut errors = FormErrors::new();
            if CrudService::username_exists(&state.pool, &driver.username).await? {
                errors.add("username", ValidationError::UsernameTaken);
            } else {
                errors.add("license_number", license_taken());
            }
            Ok(redisplay(&errors))
        }
        Err(e) => Err(e),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let driver: Driver = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let data = DriverUpdateForm {
        license_number: driver.license_number.clone(),
    };
    let ctx = with(form_context(&data, &FormErrors::new()), "object", json!(driver));
    Ok(Page::new(DRIVER.template("form"), with_user(ctx, Some(&user))))
}

/// Only the license number is written; every other submitted field is ignored.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<DriverUpdateForm>,
) -> Result<Response, AppError> {
    let driver: Driver = CrudService::get(&state.pool, parse_id(&id)?).await?;
    match validate_driver_update(&state.pool, driver.id, &form).await? {
        Ok(license) => {
            if !CrudService::update_driver_license(&state.pool, driver.id, &license).await? {
                return Err(AppError::NotFound(format!("driver {}", driver.id)));
            }
            Ok(Redirect::to(DRIVER.list_url).into_response())
        }
        Err(errors) => {
            let ctx = with(form_context(&form, &errors), "object", json!(driver));
            Ok(Page::new(DRIVER.template("form"), with_user(ctx, Some(&user))).into_response())
        }
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let driver: Driver = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let ctx = json!({ "object": driver, "driver": driver });
    Ok(Page::new(DRIVER.template("confirm_delete"), with_user(ctx, Some(&user))))
}

/// Deleting a driver also ends their sessions and unlinks them from cars.
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    if !CrudService::delete::<Driver>(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("driver {}", id)));
    }
    Ok(Redirect::to(DRIVER.list_url))
}
