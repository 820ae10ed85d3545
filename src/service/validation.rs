//! Form validators. Each maps raw submitted fields to a validated field set or to
//! every error found, keyed by field. Checks that need the store take a pool.

use crate::config::{DRIVER, MANUFACTURER};
use crate::error::{AppError, FormErrors, ValidationError, NON_FIELD_ERRORS};
use crate::service::CrudService;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Outer error aborts the request; inner error redisplays the form.
pub type Checked<T> = Result<Result<T, FormErrors>, AppError>;

const MAX_CHAR_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 150;
const MIN_PASSWORD_LENGTH: usize = 8;

pub const LICENSE_MESSAGE: &str = "License number must be in the format ABC12345: \
Consist only of 8 characters, first 3 characters are uppercase letters, last 5 characters are digits.";

static LICENSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{5}$").expect("static regex"));
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("static regex"));

/// 3 uppercase ASCII letters then 5 ASCII digits, nothing else. Returns the input unchanged.
pub fn validate_license(s: &str) -> Result<&str, ValidationError> {
    if LICENSE_RE.is_match(s) {
        Ok(s)
    } else {
        Err(ValidationError::InvalidFormat(LICENSE_MESSAGE.to_string()))
    }
}

/// Trimmed, non-empty text field.
fn required_text<'a>(
    errors: &mut FormErrors,
    field: &str,
    value: Option<&'a str>,
    max_len: usize,
) -> Option<&'a str> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.add(field, ValidationError::MissingField);
            None
        }
        Some(v) if v.chars().count() > max_len => {
            errors.add(
                field,
                ValidationError::InvalidFormat(format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max_len,
                    v.chars().count()
                )),
            );
            None
        }
        Some(v) => Some(v),
    }
}

/// Password fields are not trimmed.
fn required_secret<'a>(errors: &mut FormErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value.filter(|v| !v.is_empty()) {
        None => {
            errors.add(field, ValidationError::MissingField);
            None
        }
        Some(v) => Some(v),
    }
}

fn license_field(errors: &mut FormErrors, value: Option<&str>) -> Option<String> {
    let raw = required_text(errors, "license_number", value, MAX_CHAR_LENGTH)?;
    match validate_license(raw) {
        Ok(v) => Some(v.to_string()),
        Err(e) => {
            errors.add("license_number", e);
            None
        }
    }
}

/// Minimum length, not all digits, not the username.
pub fn check_password_strength(password: &str, username: Option<&str>) -> Vec<ValidationError> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(ValidationError::WeakPassword(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(ValidationError::WeakPassword(
            "This password is entirely numeric.".into(),
        ));
    }
    if username.is_some_and(|u| u.eq_ignore_ascii_case(password)) {
        problems.push(ValidationError::WeakPassword(
            "The password is too similar to the username.".into(),
        ));
    }
    problems
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ManufacturerForm {
    pub name: Option<String>,
    pub country: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManufacturerFields {
    pub name: String,
    pub country: String,
}

pub fn validate_manufacturer(form: &ManufacturerForm) -> Result<ManufacturerFields, FormErrors> {
    let mut errors = FormErrors::new();
    let name = required_text(&mut errors, "name", form.name.as_deref(), MAX_CHAR_LENGTH);
    let country = required_text(&mut errors, "country", form.country.as_deref(), MAX_CHAR_LENGTH);
    match (name, country) {
        (Some(name), Some(country)) => errors.finish(ManufacturerFields {
            name: name.to_string(),
            country: country.to_string(),
        }),
        _ => Err(errors),
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CarForm {
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    /// Repeated checkbox field; absent means no drivers.
    #[serde(default)]
    pub drivers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarFields {
    pub model: String,
    pub manufacturer_id: i64,
    pub driver_ids: Vec<i64>,
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Shape checks only; references are resolved by `validate_car`.
pub fn clean_car(form: &CarForm) -> Result<CarFields, FormErrors> {
    let mut errors = FormErrors::new();
    let model = required_text(&mut errors, "model", form.model.as_deref(), MAX_CHAR_LENGTH);
    let manufacturer_id = match form.manufacturer.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.add("manufacturer", ValidationError::MissingField);
            None
        }
        Some(raw) => match parse_id(raw) {
            Some(id) => Some(id),
            None => {
                errors.add("manufacturer", ValidationError::ReferenceNotFound(raw.to_string()));
                None
            }
        },
    };
    let mut driver_ids = Vec::with_capacity(form.drivers.len());
    for raw in form.drivers.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
        match parse_id(raw) {
            Some(id) if !driver_ids.contains(&id) => driver_ids.push(id),
            Some(_) => {}
            None => errors.add("drivers", ValidationError::ReferenceNotFound(raw.to_string())),
        }
    }
    match (model, manufacturer_id) {
        (Some(model), Some(manufacturer_id)) => errors.finish(CarFields {
            model: model.to_string(),
            manufacturer_id,
            driver_ids,
        }),
        _ => Err(errors),
    }
}

/// Shape checks, then manufacturer and driver ids must resolve.
pub async fn validate_car(pool: &SqlitePool, form: &CarForm) -> Checked<CarFields> {
    let fields = match clean_car(form) {
        Ok(f) => f,
        Err(errors) => return Ok(Err(errors)),
    };
    let mut errors = FormErrors::new();
    if !CrudService::exists(pool, &MANUFACTURER, fields.manufacturer_id).await? {
        errors.add(
            "manufacturer",
            ValidationError::ReferenceNotFound(fields.manufacturer_id.to_string()),
        );
    }
    for id in &fields.driver_ids {
        if !CrudService::exists(pool, &DRIVER, *id).await? {
            errors.add("drivers", ValidationError::ReferenceNotFound(id.to_string()));
        }
    }
    Ok(errors.finish(fields))
}

#[derive(Clone, Default, Deserialize)]
pub struct DriverCreateForm {
    pub username: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub license_number: Option<String>,
}

impl std::fmt::Debug for DriverCreateForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverCreateForm")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("license_number", &self.license_number)
            .finish_non_exhaustive()
    }
}

/// Submitted values safe to echo back into a redisplayed form.
#[derive(Clone, Debug, Serialize)]
pub struct DriverCreateEcho {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub license_number: Option<String>,
}

impl DriverCreateForm {
    pub fn echo(&self) -> DriverCreateEcho {
        DriverCreateEcho {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            license_number: self.license_number.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl std::fmt::Debug for NewDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewDriver")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("license_number", &self.license_number)
            .finish_non_exhaustive()
    }
}

/// Field rules of the signup form, without store lookups.
pub fn clean_driver_create(form: &DriverCreateForm) -> Result<NewDriver, FormErrors> {
    let mut errors = FormErrors::new();
    let username = required_text(&mut errors, "username", form.username.as_deref(), MAX_NAME_LENGTH);
    let username = username.and_then(|u| {
        if USERNAME_RE.is_match(u) {
            Some(u)
        } else {
            errors.add(
                "username",
                ValidationError::InvalidFormat(
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                        .into(),
                ),
            );
            None
        }
    });
    let password1 = required_secret(&mut errors, "password1", form.password1.as_deref());
    let password2 = required_secret(&mut errors, "password2", form.password2.as_deref());
    let first_name = required_text(&mut errors, "first_name", form.first_name.as_deref(), MAX_NAME_LENGTH);
    let last_name = required_text(&mut errors, "last_name", form.last_name.as_deref(), MAX_NAME_LENGTH);
    let license_number = license_field(&mut errors, form.license_number.as_deref());

    let password = match (password1, password2) {
        (Some(p1), Some(p2)) if p1 != p2 => {
            errors.add("password2", ValidationError::PasswordMismatch);
            None
        }
        (Some(p1), Some(_)) => {
            let problems = check_password_strength(p1, username);
            if problems.is_empty() {
                Some(p1)
            } else {
                for p in problems {
                    errors.add("password2", p);
                }
                None
            }
        }
        _ => None,
    };

    match (username, password, first_name, last_name, license_number) {
        (Some(username), Some(password), Some(first_name), Some(last_name), Some(license_number)) => {
            errors.finish(NewDriver {
                username: username.to_string(),
                password: password.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                license_number,
            })
        }
        _ => Err(errors),
    }
}

/// Signup rules plus username and license uniqueness.
pub async fn validate_driver_create(pool: &SqlitePool, form: &DriverCreateForm) -> Checked<NewDriver> {
    let mut errors = match clean_driver_create(form) {
        Ok(driver) => {
            let mut errors = FormErrors::new();
            if CrudService::username_exists(pool, &driver.username).await? {
                errors.add("username", ValidationError::UsernameTaken);
            }
            if CrudService::license_owner(pool, &driver.license_number).await?.is_some() {
                errors.add("license_number", license_taken());
            }
            return Ok(errors.finish(driver));
        }
        Err(errors) => errors,
    };
    // Report a taken username alongside field errors, as a single pass would.
    if let Some(username) = form.username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !errors.has("username") && CrudService::username_exists(pool, username).await? {
            errors.add("username", ValidationError::UsernameTaken);
        }
    }
    Ok(Err(errors))
}

pub fn license_taken() -> ValidationError {
    ValidationError::Duplicate("Driver with this License number already exists.".into())
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DriverUpdateForm {
    pub license_number: Option<String>,
}

pub fn clean_driver_update(form: &DriverUpdateForm) -> Result<String, FormErrors> {
    let mut errors = FormErrors::new();
    match license_field(&mut errors, form.license_number.as_deref()) {
        Some(license) => errors.finish(license),
        None => Err(errors),
    }
}

/// Only `license_number` is writable; it must be well formed and not held by another driver.
pub async fn validate_driver_update(pool: &SqlitePool, driver_id: i64, form: &DriverUpdateForm) -> Checked<String> {
    let license = match clean_driver_update(form) {
        Ok(l) => l,
        Err(errors) => return Ok(Err(errors)),
    };
    let mut errors = FormErrors::new();
    if let Some(owner) = CrudService::license_owner(pool, &license).await? {
        if owner != driver_id {
            errors.add("license_number", license_taken());
        }
    }
    Ok(errors.finish(license))
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CarSearchForm {
    pub model: Option<String>,
}

impl CarSearchForm {
    /// The prefix to filter by. Empty, blank or over-long input means no filter.
    pub fn prefix(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && m.chars().count() <= MAX_CHAR_LENGTH)
    }

    /// Value echoed back into the search box.
    pub fn current(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub next: Option<String>,
}

#[cfg_attr(test, derive(Debug))]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

pub fn clean_login(form: &LoginForm) -> Result<Credentials<'_>, FormErrors> {
    let mut errors = FormErrors::new();
    let username = required_text(&mut errors, "username", form.username.as_deref(), MAX_NAME_LENGTH);
    let password = required_secret(&mut errors, "password", form.password.as_deref());
    match (username, password) {
        (Some(username), Some(password)) => errors.finish(Credentials { username, password }),
        _ => Err(errors),
    }
}

pub fn invalid_login() -> FormErrors {
    let mut errors = FormErrors::new();
    errors.add(
        NON_FIELD_ERRORS,
        ValidationError::InvalidFormat(
            "Please enter a correct username and password. Note that both fields may be case-sensitive.".into(),
        ),
    );
    errors
}
