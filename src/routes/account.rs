//! Login and logout.

use crate::handlers::account::{login, login_form, logout};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn account_routes(state: AppState) -> Router {
    Router::new()
        .route("/accounts/login/", get(login_form).post(login))
        .route("/accounts/logout/", post(logout))
        .with_state(state)
}
