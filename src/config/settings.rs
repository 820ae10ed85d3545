//! Runtime settings read from the environment (`.env` is loaded first when present).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://taxi.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
/// Two weeks.
const DEFAULT_SESSION_TTL_SECS: u64 = 1_209_600;
/// Ten years.
const MAX_SESSION_TTL_SECS: u64 = 315_360_000;

/// Credentials for the driver seeded at startup so the first login is possible.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub body_limit: usize,
    pub session_ttl: Duration,
    /// Sets the `Secure` attribute on the session cookie.
    pub secure_cookies: bool,
    pub admin: Option<AdminSeed>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            body_limit: DEFAULT_BODY_LIMIT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            secure_cookies: false,
            admin: None,
        }
    }
}

impl Settings {
    /// Load `.env` (if any) and read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = parse_or("BIND_ADDR", &lookup, DEFAULT_BIND_ADDR.parse().ok())?;
        let max_connections = parse_or("MAX_DB_CONNECTIONS", &lookup, Some(DEFAULT_MAX_CONNECTIONS))?;
        let body_limit = parse_or("BODY_LIMIT_BYTES", &lookup, Some(DEFAULT_BODY_LIMIT))?;
        let ttl_secs: u64 = parse_or("SESSION_TTL_SECS", &lookup, Some(DEFAULT_SESSION_TTL_SECS))?;
        let secure_cookies = parse_or("SECURE_COOKIES", &lookup, Some(false))?;

        if !(1..=MAX_SESSION_TTL_SECS).contains(&ttl_secs) {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_DB_CONNECTIONS",
                value: "0".into(),
            });
        }

        let admin = match (
            lookup("TAXI_ADMIN_USERNAME").filter(|s| !s.is_empty()),
            lookup("TAXI_ADMIN_PASSWORD").filter(|s| !s.is_empty()),
        ) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteAdmin),
        };

        Ok(Settings {
            database_url,
            bind_addr,
            max_connections,
            body_limit,
            session_ttl: Duration::from_secs(ttl_secs),
            secure_cookies,
            admin,
        })
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => default.ok_or(ConfigError::InvalidValue {
            key,
            value: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.database_url, "sqlite://taxi.db");
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.max_connections, 5);
        assert!(s.admin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let s = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SECURE_COOKIES", "true"),
            ("TAXI_ADMIN_USERNAME", "admin"),
            ("TAXI_ADMIN_PASSWORD", "s3cret-pass"),
        ]))
        .unwrap();
        assert_eq!(s.database_url, "sqlite::memory:");
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(s.secure_cookies);
        assert_eq!(s.admin.unwrap().username, "admin");
    }

    #[test]
    fn rejects_garbage_and_half_configured_admin() {
        assert!(matches!(
            Settings::from_lookup(lookup(&[("MAX_DB_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidValue { key: "MAX_DB_CONNECTIONS", .. })
        ));
        assert!(matches!(
            Settings::from_lookup(lookup(&[("TAXI_ADMIN_USERNAME", "admin")])),
            Err(ConfigError::IncompleteAdmin)
        ));
    }

    #[test]
    fn session_ttl_must_be_within_range() {
        let s = Settings::from_lookup(lookup(&[("SESSION_TTL_SECS", "3600")])).unwrap();
        assert_eq!(s.session_ttl, Duration::from_secs(3600));
        for bad in ["0", "10000000000000", "-5"] {
            assert!(
                matches!(
                    Settings::from_lookup(lookup(&[("SESSION_TTL_SECS", bad)])),
                    Err(ConfigError::InvalidValue { key: "SESSION_TTL_SECS", .. })
                ),
                "{bad}"
            );
        }
    }
}
