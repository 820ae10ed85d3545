//! Car list with model search, detail, create, update, delete.

use crate::config::CAR;
use crate::error::{AppError, FormErrors};
use crate::extractors::CurrentUser;
use crate::handlers::{form_context, list_page, parse_id, with, with_user};
use crate::models::{Car, Choice, Driver, Manufacturer};
use crate::response::{list_context, Page};
use crate::service::validation::{validate_car, CarForm, CarSearchForm};
use crate::service::{CrudService, Session};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

#[derive(Debug, Default, Deserialize)]
pub struct CarListQuery {
    pub model: Option<String>,
    pub page: Option<String>,
}

/// Cars whose model starts with `?model=` (case-sensitive), with their manufacturers.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<CarListQuery>,
) -> Result<Page, AppError> {
    let search = CarSearchForm { model: query.model };
    let (rows, window) = list_page::<Car>(&state.pool, search.prefix(), query.page.as_deref()).await?;
    let ctx = list_context(CAR.list_name, &rows, &window);
    let ctx = with(ctx, "search_form", json!({ "model": search.current() }));
    Ok(Page::new(CAR.template("list"), with_user(ctx, Some(&user))))
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let mut car: Car = CrudService::get(&state.pool, parse_id(&id)?).await?;
    CrudService::load_drivers_for(&state.pool, &mut car).await?;
    let ctx = json!({ "object": car, "car": car });
    Ok(Page::new(CAR.template("detail"), with_user(ctx, Some(&user))))
}

/// Form page with the manufacturer and driver choice lists.
async fn form_page(
    pool: &SqlitePool,
    data: &CarForm,
    errors: &FormErrors,
    object: Option<&Car>,
    user: &Session,
) -> Result<Page, AppError> {
    let manufacturers: Vec<Manufacturer> = CrudService::all(pool).await?;
    let drivers: Vec<Driver> = CrudService::all(pool).await?;
    let mut ctx = form_context(data, errors);
    ctx = with(
        ctx,
        "manufacturer_choices",
        json!(manufacturers.iter().map(Choice::of).collect::<Vec<_>>()),
    );
    ctx = with(
        ctx,
        "driver_choices",
        json!(drivers.iter().map(Choice::of).collect::<Vec<_>>()),
    );
    if let Some(car) = object {
        ctx = with(ctx, "object", json!(car));
    }
    Ok(Page::new(CAR.template("form"), with_user(ctx, Some(user))))
}

pub async fn create_form(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Page, AppError> {
    form_page(&state.pool, &CarForm::default(), &FormErrors::new(), None, &user).await
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<CarForm>,
) -> Result<Response, AppError> {
    match validate_car(&state.pool, &form).await? {
        Ok(fields) => {
            CrudService::insert_car(&state.pool, &fields).await?;
            Ok(Redirect::to(CAR.list_url).into_response())
        }
        Err(errors) => Ok(form_page(&state.pool, &form, &errors, None, &user).await?.into_response()),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let mut car: Car = CrudService::get(&state.pool, parse_id(&id)?).await?;
    CrudService::load_drivers_for(&state.pool, &mut car).await?;
    let data = CarForm {
        model: Some(car.model.clone()),
        manufacturer: Some(car.manufacturer.id.to_string()),
        drivers: car.drivers.iter().map(|d| d.id.to_string()).collect(),
    };
    form_page(&state.pool, &data, &FormErrors::new(), Some(&car), &user).await
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CarForm>,
) -> Result<Response, AppError> {
    let car: Car = CrudService::get(&state.pool, parse_id(&id)?).await?;
    match validate_car(&state.pool, &form).await? {
        Ok(fields) => {
            if !CrudService::update_car(&state.pool, car.id, &fields).await? {
                return Err(AppError::NotFound(format!("car {}", car.id)));
            }
            Ok(Redirect::to(CAR.list_url).into_response())
        }
        Err(errors) => Ok(form_page(&state.pool, &form, &errors, Some(&car), &user)
            .await?
            .into_response()),
    }
}

pub async fn delete_confirm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Page, AppError> {
    let car: Car = CrudService::get(&state.pool, parse_id(&id)?).await?;
    let ctx = json!({ "object": car, "car": car });
    Ok(Page::new(CAR.template("confirm_delete"), with_user(ctx, Some(&user))))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    if !CrudService::delete::<Car>(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("car {}", id)));
    }
    Ok(Redirect::to(CAR.list_url))
}
