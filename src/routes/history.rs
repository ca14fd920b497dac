use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::Deserialize;

use crate::db::models::HistoryEntry;
use crate::db::queries::get_history;
use crate::routes::chat::DEFAULT_SESSION_ID;
use crate::utils::config::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub session_id: Option<String>,
    pub limit: Option<i64>,
}

// Conversation history for a session, oldest first. A persistence failure
// yields an empty list rather than an error response.
pub async fn history_handler(
    State(app_state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<HistoryEntry>> {
    let session_id = params
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    let limit = effective_limit(params.limit);

    match get_history(&app_state.db, &session_id, limit).await {
        Ok(conversations) => {
            tracing::info!("Retrieved {} conversations for session: {}", conversations.len(), session_id);
            Json(conversations.into_iter().map(HistoryEntry::from).collect())
        }
        Err(e) => {
            tracing::error!("Failed to fetch history: {}", e);
            Json(Vec::new())
        }
    }
}

/// Row limit actually sent to the store: default 50, hard cap 100, and
/// zero or negative requests fetch nothing.
fn effective_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT)
}

// Create the router for history routes
pub fn create_history_router() -> Router<AppState> {
    Router::new().route("/history", get(history_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_to_fifty() {
        assert_eq!(effective_limit(None), 50);
    }

    #[test]
    fn test_limit_is_capped_at_one_hundred() {
        assert_eq!(effective_limit(Some(1000)), 100);
        assert_eq!(effective_limit(Some(100)), 100);
    }

    #[test]
    fn test_limit_zero_fetches_nothing() {
        assert_eq!(effective_limit(Some(0)), 0);
    }

    #[test]
    fn test_negative_limit_clamps_to_zero() {
        assert_eq!(effective_limit(Some(-5)), 0);
    }

    #[test]
    fn test_in_range_limit_passes_through() {
        assert_eq!(effective_limit(Some(25)), 25);
    }
}
