//! Login and logout. Successful logins start a server-side session named by the `sessionid` cookie.

use crate::error::{AppError, FormErrors};
use crate::extractors::SESSION_COOKIE;
use crate::handlers::form_context;
use crate::response::Page;
use crate::service::password::verify_password;
use crate::service::validation::{clean_login, invalid_login, LoginForm};
use crate::service::{CrudService, SessionStore};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::Form;
use serde::Deserialize;
use serde_json::json;

const LOGIN_TEMPLATE: &str = "registration/login.html";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only local absolute paths made of visible ASCII; anything else falls back to the dashboard.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n)
            if n.starts_with('/')
                && !n.starts_with("//")
                && !n.contains('\\')
                && n.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            n
        }
        _ => "/",
    }
}

fn login_page(username: Option<&str>, next: &str, errors: &FormErrors) -> Page {
    let mut ctx = form_context(&json!({ "username": username.unwrap_or("") }), errors);
    if let serde_json::Value::Object(map) = &mut ctx {
        map.insert("next".into(), json!(next));
    }
    Page::new(LOGIN_TEMPLATE, ctx)
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Page {
    login_page(None, safe_next(query.next.as_deref()), &FormErrors::new())
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let creds = match clean_login(&form) {
        Ok(c) => c,
        Err(errors) => return Ok(login_page(form.username.as_deref(), &next, &errors).into_response()),
    };
    let account = CrudService::credentials(&state.pool, creds.username).await?;
    let driver_id = match account {
        Some((id, hash)) if verify_password(creds.password, &hash) => id,
        _ => {
            tracing::warn!(username = %creds.username, "failed login");
            return Ok(login_page(Some(creds.username), &next, &invalid_login()).into_response());
        }
    };
    let session = SessionStore::create(&state.pool, driver_id, creds.username, state.settings.session_ttl).await?;
    tracing::info!(driver_id, username = %creds.username, "login");
    let cookie = Cookie::build((SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.settings.secure_cookies);
    Ok((jar.add(cookie), Redirect::to(&next)).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        SessionStore::destroy(&state.pool, &token).await?;
        tracing::info!("logout");
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to(crate::error::LOGIN_URL)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/cars/?model=T")), "/cars/?model=T");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn next_with_whitespace_or_non_ascii_is_dropped() {
        assert_eq!(safe_next(Some("/cars/?model=\u{160}koda")), "/");
        assert_eq!(safe_next(Some("/cars/\n")), "/");
        assert_eq!(safe_next(Some("/\t/evil.example")), "/");
        assert_eq!(safe_next(Some("/cars/?model=a b")), "/");
        assert_eq!(safe_next(Some("/cars/?model=%C5%A0koda")), "/cars/?model=%C5%A0koda");
    }
}
