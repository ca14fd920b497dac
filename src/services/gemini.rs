use async_trait::async_trait;
use gemini_rust::Gemini;
use std::env;

use crate::errors::{AppError, AppResult, CapabilityError};

/// Contract for the external generation capability. Transport, auth and quota
/// failures all surface as `GenerationUnavailable`; the orchestrator turns
/// them into a degraded local answer instead of an HTTP error.
#[async_trait]
pub trait GenerateAnswer: Send + Sync {
    async fn generate(&self, query: &str, context: &str) -> Result<String, CapabilityError>;
}

pub struct GeminiService {
    client: Gemini,
}

impl GeminiService {
    pub fn new() -> AppResult<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::Other("GEMINI_API_KEY environment variable not set".to_string()))?;

        let client = Gemini::new(api_key)
            .map_err(|e| AppError::Other(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl GenerateAnswer for GeminiService {
    async fn generate(&self, query: &str, context: &str) -> Result<String, CapabilityError> {
        let prompt = format!(
            "You are Prat.AI, a helpful hybrid AI assistant. Based on the following context, please answer the user's question. If the context doesn't contain enough information to answer the question, please say so.\n\nContext:\n{}\n\nUser Question: {}\n\nAnswer:",
            context, query
        );

        tracing::info!("Sending request to Gemini API");

        let response = self
            .client
            .generate_content()
            .with_user_message(&prompt)
            .execute()
            .await
            .map_err(|e| CapabilityError::GenerationUnavailable(format!("Gemini API error: {}", e)))?;

        let response_text = response.text();
        tracing::info!("Generated response from Gemini API");

        Ok(response_text)
    }
}
