//! Server-held sessions keyed by an opaque token the client presents in a cookie.

use crate::error::{AppError, ConfigError};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::time::Duration;

/// Per-visitor state. Only `num_visits` is mutable through the store.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub driver_id: i64,
    pub username: String,
    pub num_visits: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Count one more visit. Returns the count before this visit.
    pub fn visit(&mut self) -> i64 {
        let before = self.num_visits;
        self.num_visits += 1;
        before
    }
}

pub struct SessionStore;

impl SessionStore {
    /// Start a session for a driver that just logged in.
    pub async fn create(
        pool: &SqlitePool,
        driver_id: i64,
        username: &str,
        ttl: Duration,
    ) -> Result<Session, AppError> {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Config(ConfigError::InvalidValue {
                    key: "SESSION_TTL_SECS",
                    value: ttl.as_secs().to_string(),
                })
            })?;
        sqlx::query(
            "INSERT INTO taxi_session (token, driver_id, num_visits, created_at, expires_at) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(&token)
        .bind(driver_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(pool)
        .await?;
        tracing::info!(driver_id, "session started");
        Ok(Session {
            token,
            driver_id,
            username: username.to_string(),
            num_visits: 0,
            expires_at,
        })
    }

    /// Live session for `token`. Expired sessions are removed and reported as absent.
    pub async fn load(pool: &SqlitePool, token: &str) -> Result<Option<Session>, AppError> {
        let session: Option<Session> = sqlx::query_as(
            r#"SELECT s.token, s.driver_id, d.username, s.num_visits, s.expires_at
               FROM taxi_session s JOIN taxi_driver d ON d.id = s.driver_id
               WHERE s.token = ?"#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;
        match session {
            Some(s) if s.expires_at <= Utc::now() => {
                Self::destroy(pool, token).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Write back the visit counter. Concurrent requests in one session are last-write-wins.
    pub async fn save(pool: &SqlitePool, session: &Session) -> Result<(), AppError> {
        sqlx::query("UPDATE taxi_session SET num_visits = ? WHERE token = ?")
            .bind(session.num_visits)
            .bind(&session.token)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn destroy(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM taxi_session WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CrudService;
    use crate::store::connect_in_memory;

    #[tokio::test]
    async fn visits_persist_per_session() {
        let pool = connect_in_memory().await.unwrap();
        let driver = CrudService::insert_account(&pool, "driver", "hash").await.unwrap();
        let mut s = SessionStore::create(&pool, driver, "driver", Duration::from_secs(60)).await.unwrap();
        assert_eq!(s.username, "driver");
        assert_eq!(s.visit(), 0);
        SessionStore::save(&pool, &s).await.unwrap();

        let mut again = SessionStore::load(&pool, &s.token).await.unwrap().unwrap();
        assert_eq!(again.visit(), 1);
        assert_eq!(again.num_visits, 2);

        let other = SessionStore::create(&pool, driver, "driver", Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.num_visits, 0);
    }

    #[tokio::test]
    async fn expired_and_destroyed_sessions_are_gone() {
        let pool = connect_in_memory().await.unwrap();
        let driver = CrudService::insert_account(&pool, "driver", "hash").await.unwrap();
        let s = SessionStore::create(&pool, driver, "driver", Duration::from_secs(0)).await.unwrap();
        assert!(SessionStore::load(&pool, &s.token).await.unwrap().is_none());
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM taxi_session").fetch_one(&pool).await.unwrap();
        assert_eq!(rows, 0);

        let s = SessionStore::create(&pool, driver, "driver", Duration::from_secs(60)).await.unwrap();
        SessionStore::destroy(&pool, &s.token).await.unwrap();
        assert!(SessionStore::load(&pool, &s.token).await.unwrap().is_none());
        assert!(SessionStore::load(&pool, "no-such-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unrepresentable_lifetime_is_a_config_error() {
        let pool = connect_in_memory().await.unwrap();
        let driver = CrudService::insert_account(&pool, "driver", "hash").await.unwrap();
        let err = SessionStore::create(&pool, driver, "driver", Duration::from_secs(10_000_000_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidValue { .. })));
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM taxi_session").fetch_one(&pool).await.unwrap();
        assert_eq!(rows, 0);
    }
}
