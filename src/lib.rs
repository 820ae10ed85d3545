//! Taxi service: manufacturers, cars and drivers behind session login.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::Settings;
pub use error::{AppError, ConfigError};
pub use response::Page;
pub use routes::{account_routes, app, common_routes, taxi_routes};
pub use service::{CrudService, SessionStore};
pub use state::AppState;
pub use store::{connect, connect_in_memory, init_schema};
