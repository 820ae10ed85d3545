//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("incomplete bootstrap user: set both TAXI_ADMIN_USERNAME and TAXI_ADMIN_PASSWORD")]
    IncompleteAdmin,
}

/// Field-scoped validation failures. Recovered by redisplaying the form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required.")]
    MissingField,
    #[error("{0}")]
    InvalidFormat(String),
    #[error("A user with that username already exists.")]
    UsernameTaken,
    #[error("The two password fields didn't match.")]
    PasswordMismatch,
    #[error("{0}")]
    WeakPassword(String),
    #[error("Select a valid choice. {0} is not one of the available choices.")]
    ReferenceNotFound(String),
    #[error("{0}")]
    Duplicate(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField => "missing_field",
            ValidationError::InvalidFormat(_) => "invalid_format",
            ValidationError::UsernameTaken => "username_taken",
            ValidationError::PasswordMismatch => "password_mismatch",
            ValidationError::WeakPassword(_) => "weak_password",
            ValidationError::ReferenceNotFound(_) => "reference_not_found",
            ValidationError::Duplicate(_) => "duplicate",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub code: &'static str,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(e: &ValidationError) -> Self {
        FieldError {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

/// Key used for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Errors collected for one form submission, keyed by field name.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<FieldError>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, err: ValidationError) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(FieldError::from(&err));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[FieldError] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication required")]
    Unauthorized { next: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    /// A write lost a race against a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Db(sqlx::Error::Database(e)) if e.is_unique_violation())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Where unauthenticated callers are sent.
pub const LOGIN_URL: &str = "/accounts/login/";

pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!("{}?next={}", LOGIN_URL, urlencoding::encode(next)))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthorized { next } => return login_redirect(next).into_response(),
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    tracing::error!(error = %e, "database error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_errors_collect_per_field() {
        let mut errors = FormErrors::new();
        errors.add("name", ValidationError::MissingField);
        errors.add("name", ValidationError::InvalidFormat("too long".into()));
        errors.add("country", ValidationError::MissingField);
        assert_eq!(errors.field("name").len(), 2);
        assert_eq!(errors.field("country")[0].code, "missing_field");
        assert!(errors.field("model").is_empty());
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn login_redirect_escapes_next() {
        let resp = login_redirect("/cars/?model=T T").into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/accounts/login/?next=%2Fcars%2F%3Fmodel%3DT%20T");
    }

    #[test]
    fn login_redirect_survives_non_ascii_next() {
        let resp = login_redirect("/cars/?model=\u{160}koda").into_response();
        let location = resp.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/accounts/login/?next=%2Fcars%2F%3Fmodel%3D%C5%A0koda");
    }
}
