use std::convert::Infallible;

use async_stream::stream;
use axum::{
    Router,
    extract::State,
    http::header,
    response::{
        Json, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::post,
};
use futures_util::{StreamExt, pin_mut};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::db::queries::log_conversation;
use crate::routes::chat::DEFAULT_SESSION_ID;
use crate::services::streaming::{CHAR_DELAY, StreamChunk, emit};
use crate::utils::config::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub message: String,
    pub session_id: Option<String>,
}

// Streaming chat endpoint: same decision logic as /chat, delivered as SSE
// frames with a typing-effect delay.
pub async fn stream_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<StreamRequest>,
) -> impl IntoResponse {
    tracing::info!("Processing stream request: {}", payload.message);

    let session_id = payload
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    let message = payload.message;

    let stream = stream! {
        let mut rng = StdRng::from_os_rng();
        let answer = match app_state.engine.respond(&message, "", &mut rng).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Stream orchestration failed: {}", e);
                // One terminal envelope instead of a transport error.
                yield Ok::<_, Infallible>(chunk_event(&StreamChunk::failure(&e.to_string())));
                return;
            }
        };

        let mut delivered = String::new();
        let chunks = emit(answer.clone(), CHAR_DELAY);
        pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            if chunk.done {
                // The full answer has been delivered; record the exchange.
                // A dropped connection never reaches this point, so the log
                // write stays at most once per served request.
                if let Err(e) = log_conversation(
                    &app_state.db,
                    &session_id,
                    &message,
                    delivered.trim(),
                    &answer,
                )
                .await
                {
                    tracing::error!("Failed to log streamed conversation: {}", e);
                }
            } else {
                delivered.push_str(&chunk.content);
            }
            yield Ok(chunk_event(&chunk));
        }
    };

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}

fn chunk_event(chunk: &StreamChunk) -> Event {
    Event::default().data(serde_json::to_string(chunk).unwrap_or_default())
}

// Create the router for streaming routes
pub fn create_stream_router() -> Router<AppState> {
    Router::new().route("/stream", post(stream_handler))
}
