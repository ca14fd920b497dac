use std::sync::{Arc, RwLock};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::errors::{AppError, AppResult, CapabilityError};
use crate::services::gemini::GenerateAnswer;
use crate::services::intent::{ClassifyIntent, IntentResult};
use crate::services::retriever::DocumentStore;
use crate::services::sentiment::AnalyzeSentiment;

pub const CONFIDENCE_THRESHOLD: f64 = 0.85;
pub const RETRIEVAL_TOP_K: usize = 3;

/// Intents the gate may answer locally without touching retrieval.
const LOCAL_INTENTS: &[&str] = &["greeting", "goodbye", "thanks"];

const APOLOGY_RESPONSE: &str = "Sorry, I don't have a response for that right now.";
const CANNOT_ANSWER_RESPONSE: &str =
    "I'm having trouble connecting to my knowledge base. Please try again.";

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey"];
const FAREWELL_WORDS: &[&str] = &["bye", "goodbye"];
const GRATITUDE_WORDS: &[&str] = &["thank", "thanks"];
const IDENTITY_PHRASES: &[&str] = &["who are you", "what are you", "your name"];

/// Which subsystem produced the final answer. The wire name is what the
/// `response_type` field carries on `/chat` and in stream metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    LocalMatch,
    Generated,
    DegradedLocal,
    DegradedNone,
    Error,
}

impl ResponseSource {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ResponseSource::LocalMatch => "ml_local",
            ResponseSource::Generated => "llm_gemini",
            ResponseSource::DegradedLocal => "ml_fallback",
            ResponseSource::DegradedNone => "fallback",
            ResponseSource::Error => "error",
        }
    }
}

/// A finalized answer plus the metadata logged and returned with it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub intent: String,
    pub confidence: f64,
    pub sentiment: String,
    pub source: ResponseSource,
}

/// Per-request decision logic: local match, retrieval-augmented generation,
/// or a degraded canned answer. Capabilities are injected at startup; a
/// capability that failed to initialize is simply absent.
pub struct ChatEngine {
    classifier: Option<Arc<dyn ClassifyIntent>>,
    sentiment: Option<Arc<dyn AnalyzeSentiment>>,
    retriever: Arc<RwLock<DocumentStore>>,
    generator: Option<Arc<dyn GenerateAnswer>>,
}

impl ChatEngine {
    pub fn new(
        classifier: Option<Arc<dyn ClassifyIntent>>,
        sentiment: Option<Arc<dyn AnalyzeSentiment>>,
        retriever: Arc<RwLock<DocumentStore>>,
        generator: Option<Arc<dyn GenerateAnswer>>,
    ) -> Self {
        Self { classifier, sentiment, retriever, generator }
    }

    /// Run one request through the decision tree. Every capability failure
    /// degrades into one of the response sources; the only hard error is
    /// internal state corruption.
    pub async fn respond<R: Rng>(
        &self,
        message: &str,
        pdf_content: &str,
        rng: &mut R,
    ) -> AppResult<Answer> {
        // Classify, with the keyword fallback standing in for an absent or
        // failing classifier.
        let intent_result = match &self.classifier {
            Some(classifier) => match classifier.classify(message) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Intent classification failed, using keyword fallback: {}", e);
                    keyword_fallback(message)
                }
            },
            None => keyword_fallback(message),
        };

        // Sentiment is informational; default to neutral rather than fail.
        let sentiment = match &self.sentiment {
            Some(analyzer) => match analyzer.analyze(message) {
                Ok(result) => result.sentiment,
                Err(e) => {
                    tracing::warn!("Sentiment analysis failed, defaulting to neutral: {}", e);
                    "neutral".to_string()
                }
            },
            None => "neutral".to_string(),
        };

        let (text, source) = if intent_result.confidence >= CONFIDENCE_THRESHOLD
            && LOCAL_INTENTS.contains(&intent_result.intent.as_str())
            && pdf_content.is_empty()
        {
            match pick_candidate(&intent_result.responses, rng) {
                Ok(text) => (text, ResponseSource::LocalMatch),
                Err(CapabilityError::NoCandidates) => {
                    tracing::warn!("No canned responses for intent '{}'", intent_result.intent);
                    (APOLOGY_RESPONSE.to_string(), ResponseSource::DegradedNone)
                }
                Err(e) => return Err(AppError::Other(e.to_string())),
            }
        } else {
            let context = self.build_context(message, pdf_content)?;
            self.generate_or_degrade(message, &context, &intent_result, rng).await
        };

        Ok(Answer {
            text: apply_branding(&text),
            intent: intent_result.intent,
            confidence: intent_result.confidence,
            sentiment,
            source,
        })
    }

    /// Retrieval context: caller-supplied PDF text first (labeled), then up
    /// to RETRIEVAL_TOP_K documents joined by a blank line.
    fn build_context(&self, message: &str, pdf_content: &str) -> AppResult<String> {
        let docs = self
            .retriever
            .read()
            .map_err(|_| AppError::Other("document store lock poisoned".to_string()))?
            .search(message, RETRIEVAL_TOP_K);

        let context = docs.join("\n\n");
        if pdf_content.is_empty() {
            Ok(context)
        } else {
            Ok(format!("PDF Content:\n{}\n\n{}", pdf_content, context))
        }
    }

    async fn generate_or_degrade<R: Rng>(
        &self,
        message: &str,
        context: &str,
        intent_result: &IntentResult,
        rng: &mut R,
    ) -> (String, ResponseSource) {
        if let Some(generator) = &self.generator {
            match generator.generate(message, context).await {
                Ok(text) => return (text, ResponseSource::Generated),
                Err(e) => {
                    tracing::warn!("Generation failed, degrading to local answer: {}", e);
                }
            }
        } else {
            tracing::warn!("Generation service not configured, degrading to local answer");
        }

        match pick_candidate(&intent_result.responses, rng) {
            Ok(text) => (text, ResponseSource::DegradedLocal),
            Err(_) => (CANNOT_ANSWER_RESPONSE.to_string(), ResponseSource::DegradedNone),
        }
    }
}

fn pick_candidate<R: Rng>(candidates: &[String], rng: &mut R) -> Result<String, CapabilityError> {
    candidates
        .choose(rng)
        .cloned()
        .ok_or(CapabilityError::NoCandidates)
}

/// Deterministic keyword classifier used when the loaded classifier is
/// absent or fails mid-request.
pub fn keyword_fallback(message: &str) -> IntentResult {
    let message_lower = message.to_lowercase();

    let matched = if GREETING_WORDS.iter().any(|w| message_lower.contains(w)) {
        Some("greeting")
    } else if FAREWELL_WORDS.iter().any(|w| message_lower.contains(w)) {
        Some("goodbye")
    } else if GRATITUDE_WORDS.iter().any(|w| message_lower.contains(w)) {
        Some("thanks")
    } else if IDENTITY_PHRASES.iter().any(|p| message_lower.contains(p)) {
        Some("identity")
    } else {
        None
    };

    match matched {
        Some(intent) => IntentResult {
            intent: intent.to_string(),
            confidence: 0.9,
            responses: fallback_responses(intent).iter().map(|s| s.to_string()).collect(),
        },
        None => IntentResult {
            intent: "unknown".to_string(),
            confidence: 0.1,
            responses: Vec::new(),
        },
    }
}

fn fallback_responses(intent: &str) -> &'static [&'static str] {
    match intent {
        "greeting" => &["Hello! I am Prat.AI, your hybrid AI assistant."],
        "goodbye" => &["Goodbye! Have a great day!"],
        "thanks" => &["You're welcome!"],
        "identity" => {
            &["I am Prat.AI, a hybrid AI assistant created by Pratyush Srivastava under PratWare."]
        }
        _ => &[],
    }
}

/// Branding-compatibility rule: every case-variant of the legacy product
/// name is rewritten to the current one, as plain substring replacement.
pub fn apply_branding(text: &str) -> String {
    text.replace("PratChat", "Prat.AI")
        .replace("pratchat", "Prat.AI")
        .replace("Pratchat", "Prat.AI")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    struct FixedClassifier(IntentResult);

    impl ClassifyIntent for FixedClassifier {
        fn classify(&self, _text: &str) -> Result<IntentResult, CapabilityError> {
            Ok(IntentResult {
                intent: self.0.intent.clone(),
                confidence: self.0.confidence,
                responses: self.0.responses.clone(),
            })
        }
    }

    struct FailingClassifier;

    impl ClassifyIntent for FailingClassifier {
        fn classify(&self, _text: &str) -> Result<IntentResult, CapabilityError> {
            Err(CapabilityError::ClassificationUnavailable("model not loaded".to_string()))
        }
    }

    /// Records every (query, context) pair it is asked to generate for.
    struct RecordingGenerator {
        reply: Option<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingGenerator {
        fn replying(text: &str) -> Self {
            Self { reply: Some(text.to_string()), calls: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: None, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl GenerateAnswer for RecordingGenerator {
        async fn generate(&self, query: &str, context: &str) -> Result<String, CapabilityError> {
            self.calls.lock().unwrap().push((query.to_string(), context.to_string()));
            self.reply.clone().ok_or_else(|| {
                CapabilityError::GenerationUnavailable("quota exceeded".to_string())
            })
        }
    }

    fn store_with(bodies: &[&str]) -> Arc<RwLock<DocumentStore>> {
        let documents = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| crate::services::retriever::Document {
                filename: format!("doc{}.txt", i),
                content: body.to_string(),
            })
            .collect();
        Arc::new(RwLock::new(DocumentStore::from_documents(documents)))
    }

    fn greeting_classifier() -> Arc<dyn ClassifyIntent> {
        Arc::new(FixedClassifier(IntentResult {
            intent: "greeting".to_string(),
            confidence: 0.92,
            responses: vec!["Hi there!".to_string()],
        }))
    }

    fn low_confidence_classifier() -> Arc<dyn ClassifyIntent> {
        Arc::new(FixedClassifier(IntentResult {
            intent: "unknown".to_string(),
            confidence: 0.1,
            responses: Vec::new(),
        }))
    }

    #[tokio::test]
    async fn test_high_confidence_greeting_answers_locally() {
        let engine = ChatEngine::new(
            Some(greeting_classifier()),
            None,
            store_with(&[]),
            Some(Arc::new(RecordingGenerator::replying("should not be called"))),
        );

        let mut rng = StdRng::seed_from_u64(7);
        let answer = engine.respond("hello", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, "Hi there!");
        assert_eq!(answer.intent, "greeting");
        assert_eq!(answer.confidence, 0.92);
        assert_eq!(answer.sentiment, "neutral");
        assert_eq!(answer.source, ResponseSource::LocalMatch);
    }

    #[tokio::test]
    async fn test_pdf_content_bypasses_local_gate() {
        let generator = Arc::new(RecordingGenerator::replying("Summary of the PDF."));
        let engine = ChatEngine::new(
            Some(greeting_classifier()),
            None,
            store_with(&["greeting etiquette around the world"]),
            Some(generator.clone()),
        );

        let mut rng = StdRng::seed_from_u64(7);
        let answer = engine.respond("hello", "attached report text", &mut rng).await.unwrap();

        assert_eq!(answer.source, ResponseSource::Generated);
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.starts_with("PDF Content:\nattached report text"));
    }

    #[tokio::test]
    async fn test_generation_context_caps_at_three_documents() {
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let engine = ChatEngine::new(
            Some(low_confidence_classifier()),
            None,
            store_with(&["qubit one", "qubit two", "qubit three", "qubit four"]),
            Some(generator.clone()),
        );

        let mut rng = StdRng::seed_from_u64(1);
        engine.respond("what is a qubit", "", &mut rng).await.unwrap();

        let calls = generator.calls.lock().unwrap();
        let context = &calls[0].1;
        assert!(context.contains("qubit one"));
        assert!(context.contains("qubit three"));
        assert!(!context.contains("qubit four"));
    }

    #[tokio::test]
    async fn test_generation_success_is_tagged_llm() {
        let engine = ChatEngine::new(
            Some(low_confidence_classifier()),
            None,
            store_with(&["Quantum computing background."]),
            Some(Arc::new(RecordingGenerator::replying("Quantum computing uses qubits."))),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("what is quantum computing", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, "Quantum computing uses qubits.");
        assert_eq!(answer.source, ResponseSource::Generated);
        assert_eq!(answer.source.as_wire(), "llm_gemini");
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_candidate() {
        let classifier = Arc::new(FixedClassifier(IntentResult {
            intent: "identity".to_string(),
            confidence: 0.5,
            responses: vec!["I am Prat.AI.".to_string()],
        }));
        let engine = ChatEngine::new(
            Some(classifier),
            None,
            store_with(&[]),
            Some(Arc::new(RecordingGenerator::failing())),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("who are you", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, "I am Prat.AI.");
        assert_eq!(answer.source, ResponseSource::DegradedLocal);
    }

    #[tokio::test]
    async fn test_generation_failure_without_candidates_is_fallback() {
        let engine = ChatEngine::new(
            Some(low_confidence_classifier()),
            None,
            store_with(&[]),
            Some(Arc::new(RecordingGenerator::failing())),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("explain dark matter", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, CANNOT_ANSWER_RESPONSE);
        assert_eq!(answer.source, ResponseSource::DegradedNone);
        assert_eq!(answer.source.as_wire(), "fallback");
    }

    #[tokio::test]
    async fn test_absent_generator_degrades_the_same_way() {
        let engine =
            ChatEngine::new(Some(low_confidence_classifier()), None, store_with(&[]), None);

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("explain dark matter", "", &mut rng).await.unwrap();

        assert_eq!(answer.source, ResponseSource::DegradedNone);
    }

    #[tokio::test]
    async fn test_local_gate_with_empty_candidates_apologizes() {
        let classifier = Arc::new(FixedClassifier(IntentResult {
            intent: "greeting".to_string(),
            confidence: 0.95,
            responses: Vec::new(),
        }));
        let engine = ChatEngine::new(Some(classifier), None, store_with(&[]), None);

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("hello", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, APOLOGY_RESPONSE);
        assert_eq!(answer.source, ResponseSource::DegradedNone);
    }

    #[tokio::test]
    async fn test_failing_classifier_uses_keyword_fallback() {
        let engine = ChatEngine::new(Some(Arc::new(FailingClassifier)), None, store_with(&[]), None);

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("hello there", "", &mut rng).await.unwrap();

        assert_eq!(answer.intent, "greeting");
        assert_eq!(answer.source, ResponseSource::LocalMatch);
    }

    #[tokio::test]
    async fn test_seeded_rng_makes_candidate_choice_deterministic() {
        let classifier = Arc::new(FixedClassifier(IntentResult {
            intent: "greeting".to_string(),
            confidence: 0.9,
            responses: vec!["Hi!".to_string(), "Hello!".to_string(), "Hey!".to_string()],
        }));
        let engine = ChatEngine::new(Some(classifier), None, store_with(&[]), None);

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let first = engine.respond("hi", "", &mut rng_a).await.unwrap();
        let second = engine.respond("hi", "", &mut rng_b).await.unwrap();

        assert_eq!(first.text, second.text);
    }

    #[tokio::test]
    async fn test_branding_rewrite_applies_to_generated_text() {
        let engine = ChatEngine::new(
            Some(low_confidence_classifier()),
            None,
            store_with(&[]),
            Some(Arc::new(RecordingGenerator::replying("I am PratChat, built by..."))),
        );

        let mut rng = StdRng::seed_from_u64(1);
        let answer = engine.respond("who made you", "", &mut rng).await.unwrap();

        assert_eq!(answer.text, "I am Prat.AI, built by...");
    }

    #[test]
    fn test_branding_covers_all_case_variants() {
        assert_eq!(apply_branding("PratChat pratchat Pratchat"), "Prat.AI Prat.AI Prat.AI");
        assert_eq!(apply_branding("no legacy name here"), "no legacy name here");
    }

    #[test]
    fn test_keyword_fallback_labels() {
        assert_eq!(keyword_fallback("hey you").intent, "greeting");
        assert_eq!(keyword_fallback("ok goodbye now").intent, "goodbye");
        assert_eq!(keyword_fallback("thanks a lot").intent, "thanks");
        assert_eq!(keyword_fallback("tell me your name").intent, "identity");

        let unknown = keyword_fallback("explain relativity");
        assert_eq!(unknown.intent, "unknown");
        assert_eq!(unknown.confidence, 0.1);
        assert!(unknown.responses.is_empty());
    }
}
