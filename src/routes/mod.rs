mod account;
mod common;
mod taxi;

pub use account::account_routes;
pub use common::common_routes;
pub use taxi::taxi_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// The whole application: taxi pages, accounts and health routes behind tracing and a body limit.
pub fn app(state: AppState) -> Router {
    let body_limit = state.settings.body_limit;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(account_routes(state.clone()))
        .merge(taxi_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
}
