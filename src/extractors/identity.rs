//! Resolve the caller's session from the `sessionid` cookie.

use crate::error::AppError;
use crate::service::{Session, SessionStore};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Session of the logged-in caller, if any.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(SESSION_COOKIE).map(|c| c.value().trim()).filter(|v| !v.is_empty()) {
            Some(t) => t.to_string(),
            None => return Ok(MaybeUser(None)),
        };
        Ok(MaybeUser(SessionStore::load(&state.pool, &token).await?))
    }
}

/// Session of the logged-in caller. Anonymous callers are redirected to the login page
/// before the handler runs.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(session) = MaybeUser::from_request_parts(parts, state).await?;
        match session {
            Some(s) => Ok(CurrentUser(s)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());
                tracing::debug!(path = %next, "anonymous request to protected route");
                Err(AppError::Unauthorized { next })
            }
        }
    }
}
