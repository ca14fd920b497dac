use sqlx::PgPool;

use crate::db::models::{Conversation, IntentCount, SentimentCount, StatsSummary};
use crate::errors::AppResult;
use crate::services::orchestrator::Answer;

/// Record one finished exchange. Called exactly once per served request,
/// after the answer is finalized; callers swallow the error so a logging
/// failure never alters the HTTP-visible outcome.
pub async fn log_conversation(
    pool: &PgPool,
    session_id: &str,
    user_message: &str,
    bot_response: &str,
    answer: &Answer,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO conversations (session_id, user_message, bot_response, intent, confidence, sentiment, response_type)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(session_id)
    .bind(user_message)
    .bind(bot_response)
    .bind(&answer.intent)
    .bind(answer.confidence)
    .bind(&answer.sentiment)
    .bind(answer.source.as_wire())
    .execute(pool)
    .await?;

    tracing::info!("Logged conversation for session: {}", session_id);
    Ok(())
}

/// Up to `limit` most recent records for a session, oldest first.
pub async fn get_history(
    pool: &PgPool,
    session_id: &str,
    limit: i64,
) -> AppResult<Vec<Conversation>> {
    let mut conversations = sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE session_id = $1 ORDER BY timestamp DESC LIMIT $2",
    )
    .bind(session_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    conversations.reverse();
    Ok(conversations)
}

/// Delete every record for a session, returning the number deleted.
pub async fn clear_history(pool: &PgPool, session_id: &str) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM conversations WHERE session_id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;

    let cleared = result.rows_affected();
    tracing::info!("Cleared {} conversations for session: {}", cleared, session_id);
    Ok(cleared)
}

/// Aggregate usage statistics across all sessions.
pub async fn get_stats(pool: &PgPool) -> AppResult<StatsSummary> {
    let total_conversations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
        .fetch_one(pool)
        .await?;

    let top_intents: Vec<(String, i64)> = sqlx::query_as(
        "SELECT intent, COUNT(*) as count FROM conversations
         WHERE intent IS NOT NULL GROUP BY intent ORDER BY count DESC LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    let sentiment_distribution: Vec<(String, i64)> = sqlx::query_as(
        "SELECT sentiment, COUNT(*) as count FROM conversations
         WHERE sentiment IS NOT NULL GROUP BY sentiment",
    )
    .fetch_all(pool)
    .await?;

    let average_confidence: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(confidence) FROM conversations WHERE confidence IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok(StatsSummary {
        total_conversations,
        top_intents: top_intents
            .into_iter()
            .map(|(intent, count)| IntentCount { intent, count })
            .collect(),
        sentiment_distribution: sentiment_distribution
            .into_iter()
            .map(|(sentiment, count)| SentimentCount { sentiment, count })
            .collect(),
        average_confidence: average_confidence.unwrap_or(0.0),
    })
}
