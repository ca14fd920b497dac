use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One finished exchange. Append-only: rows are never updated, only deleted
/// in bulk by session.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Conversation {
    pub id: i32,
    pub session_id: String,
    pub user_message: String,
    pub bot_response: String,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
    pub sentiment: Option<String>,
    pub response_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// History response DTO
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i32,
    pub user_message: String,
    pub bot_response: String,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
    pub sentiment: Option<String>,
    pub response_type: Option<String>,
    pub timestamp: String,
}

impl From<Conversation> for HistoryEntry {
    fn from(conv: Conversation) -> Self {
        Self {
            id: conv.id,
            user_message: conv.user_message,
            bot_response: conv.bot_response,
            intent: conv.intent,
            confidence: conv.confidence,
            sentiment: conv.sentiment,
            response_type: conv.response_type,
            timestamp: conv.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IntentCount {
    pub intent: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SentimentCount {
    pub sentiment: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub total_conversations: i64,
    pub top_intents: Vec<IntentCount>,
    pub sentiment_distribution: Vec<SentimentCount>,
    pub average_confidence: f64,
}
