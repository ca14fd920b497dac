use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::db::queries::log_conversation;
use crate::services::orchestrator::ResponseSource;
use crate::utils::config::AppState;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub pdf_content: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub intent: String,
    pub confidence: f64,
    pub sentiment: String,
    pub response_type: String,
}

// Main chat endpoint: classify, answer (local / generated / degraded), log
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    tracing::info!("Processing chat request: {}", payload.message);

    let session_id = payload
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let mut rng = StdRng::from_os_rng();
    let answer = match app_state
        .engine
        .respond(&payload.message, &payload.pdf_content, &mut rng)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!("Chat orchestration failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    response: "Sorry, I encountered an error.".to_string(),
                    intent: "unknown".to_string(),
                    confidence: 0.0,
                    sentiment: "neutral".to_string(),
                    response_type: ResponseSource::Error.as_wire().to_string(),
                }),
            );
        }
    };

    // Log with PDF indicator; a failed write never affects the response.
    let log_message = if payload.pdf_content.is_empty() {
        payload.message.clone()
    } else {
        format!("{} [PDF: Yes]", payload.message)
    };
    if let Err(e) = log_conversation(&app_state.db, &session_id, &log_message, &answer.text, &answer).await
    {
        tracing::error!("Failed to log conversation: {}", e);
    }

    (
        StatusCode::OK,
        Json(ChatResponse {
            response: answer.text,
            intent: answer.intent,
            confidence: answer.confidence,
            sentiment: answer.sentiment,
            response_type: answer.source.as_wire().to_string(),
        }),
    )
}

// Create the router for chat routes
pub fn create_chat_router() -> Router<AppState> {
    Router::new().route("/chat", post(chat_handler))
}
