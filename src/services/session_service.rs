//! Session Service
//!
//! Loads one contract's bars and keeps the opening minutes of each market
//! session.

use crate::analysis::sessions::filter_sessions;
use crate::analysis::{SessionHours, SessionMinutes, SessionWindow, TaggedBar};
use crate::error::Result;
use crate::services::catalog_service::{BarsQuery, CatalogService};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(flatten)]
    pub bars: BarsQuery,
    #[serde(default)]
    pub hours: SessionHours,
    #[serde(default)]
    pub minutes: SessionMinutes,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub windows: Vec<SessionWindow>,
    pub bars: Vec<TaggedBar>,
}

/// Session service for business logic
pub struct SessionService;

impl SessionService {
    pub fn filter(state: &AppState, request: &SessionRequest) -> Result<SessionResult> {
        let windows = SessionWindow::standard(&request.hours, &request.minutes)?;
        let bars = CatalogService::load_bars(state, &request.bars)?;
        let tagged = filter_sessions(&bars, &windows);

        info!(
            "SessionService::filter - {} of {} bars inside session windows",
            tagged.len(),
            bars.len()
        );

        Ok(SessionResult {
            windows,
            bars: tagged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Session;
    use crate::db::duckdb::tests::seed;

    #[test]
    fn test_filter_keeps_opening_minutes() {
        let state = AppState::in_memory().unwrap();
        seed(&state.duckdb);

        let request: SessionRequest =
            serde_json::from_str(r#"{"category":"6E","symbol":"6EH4"}"#).unwrap();
        let result = SessionService::filter(&state, &request).unwrap();

        assert_eq!(result.windows.len(), 3);
        // London 03:00-03:30 and New York 09:30-10:00, on both days
        let sessions: Vec<Session> = result.bars.iter().map(|b| b.session).collect();
        assert_eq!(
            sessions,
            vec![
                Session::London,
                Session::NewYork,
                Session::NewYork,
                Session::London,
                Session::NewYork,
            ]
        );
    }
}
