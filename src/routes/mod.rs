use axum::Router;

use crate::utils::config::AppState;

pub mod chat;
pub mod history;
pub mod pdf;
pub mod reset;
pub mod stats;
pub mod stream;

// All API routes, nested under /api by main
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(chat::create_chat_router())
        .merge(stream::create_stream_router())
        .merge(history::create_history_router())
        .merge(reset::create_reset_router())
        .merge(stats::create_stats_router())
        .merge(pdf::create_pdf_router())
}
