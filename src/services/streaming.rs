use std::time::Duration;

use async_stream::stream;
use futures_util::Stream;
use serde::Serialize;

use crate::services::orchestrator::Answer;

/// Inter-unit pacing delay. A UX typing effect, not backpressure.
pub const CHAR_DELAY: Duration = Duration::from_millis(20);

/// One SSE delivery unit. All units carry `content` and `done`; only the
/// terminal unit carries `metadata` (or `error` when the answer could not be
/// produced at all).
#[derive(Debug, Clone, Serialize)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StreamMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamMetadata {
    pub intent: String,
    pub confidence: f64,
    pub sentiment: String,
    pub response_type: String,
}

impl StreamChunk {
    fn content(content: String) -> Self {
        Self { content, done: false, metadata: None, error: None }
    }

    fn finished(answer: &Answer) -> Self {
        Self {
            content: String::new(),
            done: true,
            metadata: Some(StreamMetadata {
                intent: answer.intent.clone(),
                confidence: answer.confidence,
                sentiment: answer.sentiment.clone(),
                response_type: answer.source.as_wire().to_string(),
            }),
            error: None,
        }
    }

    /// Terminal envelope for a failed request. Emitted instead of a transport
    /// error so the client always sees a well-formed frame.
    pub fn failure(message: &str) -> Self {
        Self {
            content: "Sorry, I encountered an error.".to_string(),
            done: true,
            metadata: None,
            error: Some(message.to_string()),
        }
    }
}

/// Break a finalized answer into character-level delivery units with a fixed
/// pacing delay, then a terminal unit carrying the full metadata. Dropping
/// the stream stops emission immediately.
pub fn emit(answer: Answer, delay: Duration) -> impl Stream<Item = StreamChunk> {
    stream! {
        for ch in answer.text.chars() {
            yield StreamChunk::content(ch.to_string());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        yield StreamChunk::finished(&answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::orchestrator::ResponseSource;
    use futures_util::StreamExt;

    fn sample_answer() -> Answer {
        Answer {
            text: "Hi there!".to_string(),
            intent: "greeting".to_string(),
            confidence: 0.92,
            sentiment: "neutral".to_string(),
            source: ResponseSource::LocalMatch,
        }
    }

    #[tokio::test]
    async fn test_concatenated_units_reproduce_the_answer() {
        let answer = sample_answer();
        let chunks: Vec<StreamChunk> = emit(answer.clone(), Duration::ZERO).collect().await;

        let delivered: String =
            chunks.iter().filter(|c| !c.done).map(|c| c.content.as_str()).collect();
        assert_eq!(delivered.trim(), answer.text);
    }

    #[tokio::test]
    async fn test_only_terminal_unit_is_done_and_carries_metadata() {
        let chunks: Vec<StreamChunk> = emit(sample_answer(), Duration::ZERO).collect().await;

        let (terminal, body) = chunks.split_last().unwrap();
        assert!(terminal.done);
        assert!(body.iter().all(|c| !c.done && c.metadata.is_none()));

        let metadata = terminal.metadata.as_ref().unwrap();
        assert_eq!(metadata.intent, "greeting");
        assert_eq!(metadata.confidence, 0.92);
        assert_eq!(metadata.sentiment, "neutral");
        assert_eq!(metadata.response_type, "ml_local");
    }

    #[tokio::test]
    async fn test_units_are_single_characters() {
        let chunks: Vec<StreamChunk> = emit(sample_answer(), Duration::ZERO).collect().await;
        assert!(chunks.iter().filter(|c| !c.done).all(|c| c.content.chars().count() == 1));
    }

    #[test]
    fn test_failure_envelope_shape() {
        let chunk = StreamChunk::failure("boom");
        assert!(chunk.done);
        assert_eq!(chunk.content, "Sorry, I encountered an error.");
        assert_eq!(chunk.error.as_deref(), Some("boom"));

        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("metadata").is_none());
        assert_eq!(json["error"], "boom");
    }
}
