use axum::{
    Router,
    extract::State,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};

use crate::db::queries::get_stats;
use crate::utils::config::AppState;

// Aggregate usage statistics across all sessions
pub async fn stats_handler(State(app_state): State<AppState>) -> Json<Value> {
    match get_stats(&app_state.db).await {
        Ok(stats) => Json(json!({
            "total_conversations": stats.total_conversations,
            "top_intents": stats.top_intents,
            "sentiment_distribution": stats.sentiment_distribution,
            "average_confidence": (stats.average_confidence * 100.0).round() / 100.0
        })),
        Err(e) => {
            tracing::error!("Failed to fetch stats: {}", e);
            Json(json!({
                "total_conversations": 0,
                "top_intents": [],
                "sentiment_distribution": [],
                "average_confidence": 0.0
            }))
        }
    }
}

// Create the router for stats routes
pub fn create_stats_router() -> Router<AppState> {
    Router::new().route("/stats", get(stats_handler))
}
