//! Dashboard: entity totals and the per-session visit counter.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::handlers::with_user;
use crate::models::{Car, Driver, Manufacturer};
use crate::response::Page;
use crate::service::{CrudService, Session, SessionStore};
use crate::state::AppState;
use axum::extract::State;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub num_drivers: i64,
    pub num_cars: i64,
    pub num_manufacturers: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: Counts,
    /// Visits in this session before the current one.
    pub num_visits: i64,
}

/// Record one visit. Takes the session state and hands back the updated copy for the caller to persist.
pub fn dashboard(counts: Counts, mut session: Session) -> (Dashboard, Session) {
    let num_visits = session.visit();
    (Dashboard { counts, num_visits }, session)
}

pub async fn index(State(state): State<AppState>, CurrentUser(session): CurrentUser) -> Result<Page, AppError> {
    let counts = Counts {
        num_drivers: CrudService::count::<Driver>(&state.pool, None).await?,
        num_cars: CrudService::count::<Car>(&state.pool, None).await?,
        num_manufacturers: CrudService::count::<Manufacturer>(&state.pool, None).await?,
    };
    let (board, session) = dashboard(counts, session);
    SessionStore::save(&state.pool, &session).await?;
    Ok(Page::new("taxi/index.html", with_user(json!(board), Some(&session))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn dashboard_reports_previous_visits_and_increments() {
        let session = Session {
            token: "t".into(),
            driver_id: 1,
            username: "driver".into(),
            num_visits: 4,
            expires_at: Utc::now(),
        };
        let counts = Counts {
            num_drivers: 2,
            num_cars: 3,
            num_manufacturers: 1,
        };
        let (board, session) = dashboard(counts, session);
        assert_eq!(board.num_visits, 4);
        assert_eq!(session.num_visits, 5);
        let ctx = json!(board);
        assert_eq!(ctx["num_cars"], 3);
        assert_eq!(ctx["num_visits"], 4);
    }
}
