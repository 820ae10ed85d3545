//! Taxi pages. Form pages answer GET; every mutation is a POST on the same path.

use crate::handlers::{car, driver, index, manufacturer};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn taxi_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/manufacturers/", get(manufacturer::list))
        .route(
            "/manufacturers/create/",
            get(manufacturer::create_form).post(manufacturer::create),
        )
        .route(
            "/manufacturers/:id/update/",
            get(manufacturer::update_form).post(manufacturer::update),
        )
        .route(
            "/manufacturers/:id/delete/",
            get(manufacturer::delete_confirm).post(manufacturer::delete),
        )
        .route("/cars/", get(car::list))
        .route("/cars/create/", get(car::create_form).post(car::create))
        .route("/cars/:id/", get(car::detail))
        .route("/cars/:id/update/", get(car::update_form).post(car::update))
        .route("/cars/:id/delete/", get(car::delete_confirm).post(car::delete))
        .route("/drivers/", get(driver::list))
        .route("/drivers/create/", get(driver::create_form).post(driver::create))
        .route("/drivers/:id/", get(driver::detail))
        .route("/drivers/:id/update/", get(driver::update_form).post(driver::update))
        .route(
            "/drivers/:id/delete/",
            get(driver::delete_confirm).post(driver::delete),
        )
        .with_state(state)
}
