use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{AppResult, CapabilityError};

/// Result of classifying one user message. Confidence is always in [0, 1].
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f64,
    pub responses: Vec<String>,
}

/// Contract for the intent capability. The orchestrator owns the keyword
/// fallback used when classification is absent or fails.
pub trait ClassifyIntent: Send + Sync {
    fn classify(&self, text: &str) -> Result<IntentResult, CapabilityError>;
}

#[derive(Debug, Deserialize)]
struct IntentDefinition {
    intent: String,
    patterns: Vec<String>,
    responses: Vec<String>,
}

/// Keyword-overlap intent classifier with parameters loaded once at startup.
/// Parameters are read-only during serving.
pub struct IntentClassifier {
    intents: Vec<IntentDefinition>,
}

impl IntentClassifier {
    /// Load intent definitions from a JSON file under the models directory.
    pub fn load(path: &Path) -> AppResult<Self> {
        let data = fs::read_to_string(path)?;
        let intents: Vec<IntentDefinition> = serde_json::from_str(&data)?;
        tracing::info!("Loaded {} intent definitions from {:?}", intents.len(), path);
        Ok(Self { intents })
    }
}

impl ClassifyIntent for IntentClassifier {
    fn classify(&self, text: &str) -> Result<IntentResult, CapabilityError> {
        if self.intents.is_empty() {
            return Err(CapabilityError::ClassificationUnavailable(
                "no intent definitions loaded".to_string(),
            ));
        }

        let message_tokens: HashSet<String> = text
            .to_lowercase()
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut best: Option<(&IntentDefinition, f64)> = None;

        for definition in &self.intents {
            for pattern in &definition.patterns {
                let pattern_tokens: Vec<String> = pattern
                    .to_lowercase()
                    .split_whitespace()
                    .map(|t| t.to_string())
                    .collect();
                if pattern_tokens.is_empty() {
                    continue;
                }

                let matched = pattern_tokens
                    .iter()
                    .filter(|t| message_tokens.contains(*t))
                    .count();
                let score = matched as f64 / pattern_tokens.len() as f64;

                if best.is_none_or(|(_, s)| score > s) {
                    best = Some((definition, score));
                }
            }
        }

        match best {
            Some((definition, score)) if score > 0.0 => Ok(IntentResult {
                intent: definition.intent.clone(),
                confidence: score.clamp(0.0, 1.0),
                responses: definition.responses.clone(),
            }),
            _ => Ok(IntentResult {
                intent: "unknown".to_string(),
                confidence: 0.1,
                responses: Vec::new(),
            }),
        }
    }
}
