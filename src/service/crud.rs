//! Generic CRUD execution against SQLite, plus the typed writes each form needs.

use crate::config::{EntityDescriptor, CAR, DRIVER, MANUFACTURER};
use crate::error::AppError;
use crate::models::{Car, Driver, Entity};
use crate::service::validation::{CarFields, ManufacturerFields, NewDriver};
use crate::sql::{self, QueryBuf, SqlValue};
use chrono::Utc;
use sqlx::{FromRow, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const CAR_DRIVERS: &str = "taxi_car_drivers";

pub struct CrudService;

impl CrudService {
    /// Number of rows, optionally restricted by the entity's prefix filter.
    pub async fn count<E: Entity>(pool: &SqlitePool, prefix: Option<&str>) -> Result<i64, AppError> {
        let q = sql::count(E::descriptor(), prefix);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<Sqlite, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_one(pool).await?)
    }

    /// One page of rows in default order, optionally prefix-filtered.
    pub async fn list<E: Entity>(
        pool: &SqlitePool,
        prefix: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<E>, AppError> {
        let q = sql::select_list(E::descriptor(), prefix, limit, offset);
        Self::fetch_all(pool, &q).await
    }

    /// Every row, for choice lists.
    pub async fn all<E: Entity>(pool: &SqlitePool) -> Result<Vec<E>, AppError> {
        Self::list(pool, None, u32::MAX, 0).await
    }

    /// Fetch one row by primary key.
    pub async fn read<E: Entity>(pool: &SqlitePool, id: i64) -> Result<Option<E>, AppError> {
        let q = sql::select_by_id(E::descriptor(), id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<Sqlite, E>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(pool).await?)
    }

    /// Like `read`, but a missing row is `NotFound`.
    pub async fn get<E: Entity>(pool: &SqlitePool, id: i64) -> Result<E, AppError> {
        Self::read(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", E::descriptor().label, id)))
    }

    pub async fn exists(pool: &SqlitePool, entity: &EntityDescriptor, id: i64) -> Result<bool, AppError> {
        let q = sql::exists(entity, id);
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(pool).await?.is_some())
    }

    /// Delete one row by id. Returns false when nothing matched.
    pub async fn delete<E: Entity>(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
        let entity = E::descriptor();
        let q = sql::delete(entity, id);
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let deleted = query.execute(pool).await?.rows_affected() > 0;
        if deleted {
            tracing::info!(entity = entity.label, id, "deleted");
        }
        Ok(deleted)
    }

    /// Rows of `E` linked through the car/driver join table, grouped by owner id.
    async fn related<E: Entity>(
        pool: &SqlitePool,
        entity_key: &str,
        owner_key: &str,
        owner_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<E>>, AppError> {
        let mut out: HashMap<i64, Vec<E>> = HashMap::new();
        if owner_ids.is_empty() {
            return Ok(out);
        }
        let q = sql::select_through(E::descriptor(), CAR_DRIVERS, entity_key, owner_key, owner_ids);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        for row in query.fetch_all(pool).await? {
            let owner: i64 = row.try_get("owner_id")?;
            out.entry(owner).or_default().push(E::from_row(&row)?);
        }
        Ok(out)
    }

    /// Attach each driver's cars (with manufacturers) using one query for the whole slice.
    pub async fn load_cars_for(pool: &SqlitePool, drivers: &mut [Driver]) -> Result<(), AppError> {
        let ids: Vec<i64> = drivers.iter().map(|d| d.id).collect();
        let mut cars = Self::related::<Car>(pool, "car_id", "driver_id", &ids).await?;
        for driver in drivers.iter_mut() {
            driver.cars = cars.remove(&driver.id).unwrap_or_default();
        }
        Ok(())
    }

    pub async fn load_drivers_for(pool: &SqlitePool, car: &mut Car) -> Result<(), AppError> {
        let mut drivers = Self::related::<Driver>(pool, "driver_id", "car_id", &[car.id]).await?;
        car.drivers = drivers.remove(&car.id).unwrap_or_default();
        Ok(())
    }

    pub async fn insert_manufacturer(pool: &SqlitePool, fields: &ManufacturerFields) -> Result<i64, AppError> {
        let q = sql::insert(
            &MANUFACTURER,
            vec![
                ("name", fields.name.as_str().into()),
                ("country", fields.country.as_str().into()),
            ],
        );
        let id = Self::insert_returning_id(pool, &q).await?;
        tracing::info!(entity = "manufacturer", id, "created");
        Ok(id)
    }

    pub async fn update_manufacturer(
        pool: &SqlitePool,
        id: i64,
        fields: &ManufacturerFields,
    ) -> Result<bool, AppError> {
        let q = sql::update(
            &MANUFACTURER,
            id,
            vec![
                ("name", fields.name.as_str().into()),
                ("country", fields.country.as_str().into()),
            ],
        );
        let mut conn = pool.acquire().await?;
        let updated = Self::execute(&mut conn, &q).await? > 0;
        if updated {
            tracing::info!(entity = "manufacturer", id, "updated");
        }
        Ok(updated)
    }

    /// Car row and its driver links in one transaction.
    pub async fn insert_car(pool: &SqlitePool, fields: &CarFields) -> Result<i64, AppError> {
        let mut tx = pool.begin().await?;
        let q = sql::insert(
            &CAR,
            vec![
                ("model", fields.model.as_str().into()),
                ("manufacturer_id", fields.manufacturer_id.into()),
            ],
        );
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<Sqlite, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let id = query.fetch_one(&mut *tx).await?;
        Self::link_drivers(&mut tx, id, &fields.driver_ids).await?;
        tx.commit().await?;
        tracing::info!(entity = "car", id, drivers = fields.driver_ids.len(), "created");
        Ok(id)
    }

    /// Replace model, manufacturer and the full driver set in one transaction.
    pub async fn update_car(pool: &SqlitePool, id: i64, fields: &CarFields) -> Result<bool, AppError> {
        let mut tx = pool.begin().await?;
        let q = sql::update(
            &CAR,
            id,
            vec![
                ("model", fields.model.as_str().into()),
                ("manufacturer_id", fields.manufacturer_id.into()),
            ],
        );
        if Self::execute(&mut tx, &q).await? == 0 {
            return Ok(false);
        }
        sqlx::query("DELETE FROM taxi_car_drivers WHERE car_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::link_drivers(&mut tx, id, &fields.driver_ids).await?;
        tx.commit().await?;
        tracing::info!(entity = "car", id, drivers = fields.driver_ids.len(), "updated");
        Ok(true)
    }

    async fn link_drivers(conn: &mut SqliteConnection, car_id: i64, driver_ids: &[i64]) -> Result<(), AppError> {
        for driver_id in driver_ids {
            sqlx::query("INSERT OR IGNORE INTO taxi_car_drivers (car_id, driver_id) VALUES (?, ?)")
                .bind(car_id)
                .bind(*driver_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Insert a driver whose password is already hashed.
    pub async fn insert_driver(pool: &SqlitePool, driver: &NewDriver, password_hash: &str) -> Result<i64, AppError> {
        let q = sql::insert(
            &DRIVER,
            vec![
                ("username", driver.username.as_str().into()),
                ("password", password_hash.into()),
                ("first_name", driver.first_name.as_str().into()),
                ("last_name", driver.last_name.as_str().into()),
                ("license_number", driver.license_number.as_str().into()),
                ("date_joined", Utc::now().to_rfc3339().into()),
            ],
        );
        let id = Self::insert_returning_id(pool, &q).await?;
        tracing::info!(entity = "driver", id, username = %driver.username, "created");
        Ok(id)
    }

    /// Driver without profile fields or license, as created by an administrator seed.
    pub async fn insert_account(pool: &SqlitePool, username: &str, password_hash: &str) -> Result<i64, AppError> {
        let q = sql::insert(
            &DRIVER,
            vec![
                ("username", username.into()),
                ("password", password_hash.into()),
                ("license_number", SqlValue::Null),
                ("date_joined", Utc::now().to_rfc3339().into()),
            ],
        );
        Self::insert_returning_id(pool, &q).await
    }

    pub async fn update_driver_license(pool: &SqlitePool, id: i64, license_number: &str) -> Result<bool, AppError> {
        let q = sql::update(&DRIVER, id, vec![("license_number", license_number.into())]);
        let mut conn = pool.acquire().await?;
        let updated = Self::execute(&mut conn, &q).await? > 0;
        if updated {
            tracing::info!(entity = "driver", id, "license updated");
        }
        Ok(updated)
    }

    pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM taxi_driver WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// Id of the driver holding `license_number`, if any.
    pub async fn license_owner(pool: &SqlitePool, license_number: &str) -> Result<Option<i64>, AppError> {
        let owner = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM taxi_driver WHERE license_number = ?")
            .bind(license_number)
            .fetch_optional(pool)
            .await?;
        Ok(owner)
    }

    /// `(id, password hash)` for a username.
    pub async fn credentials(pool: &SqlitePool, username: &str) -> Result<Option<(i64, String)>, AppError> {
        let row: Option<(i64, String)> = sqlx::query_as("SELECT id, password FROM taxi_driver WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    async fn fetch_all<E: Entity>(pool: &SqlitePool, q: &QueryBuf) -> Result<Vec<E>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<Sqlite, E>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(pool).await?)
    }

    async fn insert_returning_id(pool: &SqlitePool, q: &QueryBuf) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<Sqlite, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_one(pool).await?)
    }

    async fn execute(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.execute(conn).await?.rows_affected())
    }
}
