use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::delete,
};
use serde::{Deserialize, Serialize};

use crate::db::queries::clear_history;
use crate::errors::AppResult;
use crate::routes::chat::DEFAULT_SESSION_ID;
use crate::utils::config::AppState;

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: String,
    pub message: String,
    pub cleared: u64,
}

// Bulk-delete every record for a session. A session with zero records
// reports a count of 0, not an error.
pub async fn reset_handler(
    State(app_state): State<AppState>,
    Query(params): Query<ResetParams>,
) -> Json<ResetResponse> {
    let session_id = params
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let result = clear_history(&app_state.db, &session_id).await;
    Json(reset_response(&session_id, result))
}

/// Wire response for a reset: the deleted count on success (0 for a session
/// with no records), a reported error message on persistence failure —
/// never a hard crash.
fn reset_response(session_id: &str, result: AppResult<u64>) -> ResetResponse {
    match result {
        Ok(cleared) => ResetResponse {
            status: "success".to_string(),
            message: format!("Cleared {} conversations for session {}", cleared, session_id),
            cleared,
        },
        Err(e) => {
            tracing::error!("Failed to reset session {}: {}", session_id, e);
            ResetResponse {
                status: "error".to_string(),
                message: e.to_string(),
                cleared: 0,
            }
        }
    }
}

// Create the router for reset routes
pub fn create_reset_router() -> Router<AppState> {
    Router::new().route("/reset", delete(reset_handler))
}
