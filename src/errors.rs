use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure kinds for the pluggable capabilities (classifier, sentiment,
/// generation). The orchestrator is the single place that interprets these:
/// every variant degrades into one of the response sources instead of
/// becoming an HTTP error.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Intent classifier unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Sentiment analyzer unavailable: {0}")]
    SentimentUnavailable(String),

    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("No canned responses available for this intent")]
    NoCandidates,
}
