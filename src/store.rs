//! Connection pool and schema bootstrap for the SQLite store.

use crate::config::{AdminSeed, Settings};
use crate::error::AppError;
use crate::service::password::hash_password;
use crate::service::CrudService;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Tables for the taxi app. Cars, join rows and sessions are removed with their parents.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS taxi_manufacturer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    country TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS taxi_driver (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    license_number TEXT NULL UNIQUE,
    date_joined TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS taxi_car (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    manufacturer_id INTEGER NOT NULL REFERENCES taxi_manufacturer(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_taxi_car_manufacturer_id ON taxi_car(manufacturer_id);

CREATE TABLE IF NOT EXISTS taxi_car_drivers (
    car_id INTEGER NOT NULL REFERENCES taxi_car(id) ON DELETE CASCADE,
    driver_id INTEGER NOT NULL REFERENCES taxi_driver(id) ON DELETE CASCADE,
    PRIMARY KEY (car_id, driver_id)
);

CREATE INDEX IF NOT EXISTS idx_taxi_car_drivers_driver_id ON taxi_car_drivers(driver_id);

CREATE TABLE IF NOT EXISTS taxi_session (
    token TEXT PRIMARY KEY,
    driver_id INTEGER NOT NULL REFERENCES taxi_driver(id) ON DELETE CASCADE,
    num_visits INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
)
"#;

/// Open the pool described by settings. Foreign keys are enforced on every connection.
pub async fn connect(settings: &Settings) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory store; every connection to `:memory:` is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables if missing. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
    // sqlx::query runs a single statement at a time.
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Create the bootstrap account unless the username already exists. Returns whether a row was added.
pub async fn seed_admin(pool: &SqlitePool, seed: &AdminSeed) -> Result<bool, AppError> {
    if CrudService::username_exists(pool, &seed.username).await? {
        return Ok(false);
    }
    let id = CrudService::insert_account(pool, &seed.username, &hash_password(&seed.password)).await?;
    tracing::info!(id, username = %seed.username, "seeded admin account");
    Ok(true)
}
