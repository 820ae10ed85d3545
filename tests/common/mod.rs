#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use taxi_service::config::Settings;
use taxi_service::service::password::hash_password_with_iterations;
use taxi_service::service::validation::{CarFields, ManufacturerFields, NewDriver};
use taxi_service::{app, connect_in_memory, AppState, CrudService, SessionStore};
use tower::ServiceExt;

/// Stored hashes carry their iteration count; a low one keeps fixtures cheap.
const FIXTURE_ITERATIONS: u32 = 1_000;

fn fixture_hash(password: &str) -> String {
    hash_password_with_iterations(password, FIXTURE_ITERATIONS)
}

pub struct Harness {
    pub pool: SqlitePool,
    pub app: Router,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = connect_in_memory().await.expect("in-memory store");
        let app = app(AppState::new(pool.clone(), Settings::default()));
        Harness { pool, app }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("request failed")
    }

    /// A driver with a live session; returns the cookie header value.
    pub async fn login_as(&self, username: &str) -> String {
        let id = self.driver(username, None).await;
        let session = SessionStore::create(&self.pool, id, username, Duration::from_secs(3600))
            .await
            .expect("session");
        format!("sessionid={}", session.token)
    }

    pub async fn driver(&self, username: &str, license: Option<&str>) -> i64 {
        match license {
            Some(license) => {
                let new = NewDriver {
                    username: username.into(),
                    password: "driver123".into(),
                    first_name: "Test".into(),
                    last_name: "Driver".into(),
                    license_number: license.into(),
                };
                CrudService::insert_driver(&self.pool, &new, &fixture_hash(&new.password))
                    .await
                    .expect("driver")
            }
            None => CrudService::insert_account(&self.pool, username, &fixture_hash("driver123"))
                .await
                .expect("account"),
        }
    }

    pub async fn manufacturer(&self, name: &str, country: &str) -> i64 {
        let fields = ManufacturerFields {
            name: name.into(),
            country: country.into(),
        };
        CrudService::insert_manufacturer(&self.pool, &fields)
            .await
            .expect("manufacturer")
    }

    pub async fn car(&self, model: &str, manufacturer_id: i64, driver_ids: Vec<i64>) -> i64 {
        let fields = CarFields {
            model: model.into(),
            manufacturer_id,
            driver_ids,
        };
        CrudService::insert_car(&self.pool, &fields).await.expect("car")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count")
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub async fn json_body(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

pub fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
