use crate::errors::CapabilityError;

/// Sentiment label for one user message. Informational only: it never drives
/// the answer-source decision.
#[derive(Debug, Clone)]
pub struct SentimentResult {
    pub sentiment: String,
}

pub trait AnalyzeSentiment: Send + Sync {
    fn analyze(&self, text: &str) -> Result<SentimentResult, CapabilityError>;
}

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "excellent", "love", "like", "happy", "thanks", "amazing",
    "wonderful", "nice", "perfect",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "angry", "sad", "wrong", "broken", "useless",
    "horrible", "worst", "annoying",
];

/// Word-list sentiment analyzer. Counts positive and negative tokens and
/// labels the message by the majority.
#[derive(Debug, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }
}

impl AnalyzeSentiment for LexiconSentiment {
    fn analyze(&self, text: &str) -> Result<SentimentResult, CapabilityError> {
        if text.trim().is_empty() {
            return Err(CapabilityError::SentimentUnavailable("empty input".to_string()));
        }

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();

        let positive = tokens.iter().filter(|t| POSITIVE_WORDS.contains(t)).count();
        let negative = tokens.iter().filter(|t| NEGATIVE_WORDS.contains(t)).count();

        let sentiment = if positive > negative {
            "positive"
        } else if negative > positive {
            "negative"
        } else {
            "neutral"
        };

        Ok(SentimentResult { sentiment: sentiment.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_message() {
        let analyzer = LexiconSentiment::new();
        let result = analyzer.analyze("this is great, I love it").unwrap();
        assert_eq!(result.sentiment, "positive");
    }

    #[test]
    fn test_negative_message() {
        let analyzer = LexiconSentiment::new();
        let result = analyzer.analyze("this is terrible and broken").unwrap();
        assert_eq!(result.sentiment, "negative");
    }

    #[test]
    fn test_neutral_message() {
        let analyzer = LexiconSentiment::new();
        let result = analyzer.analyze("what is quantum computing").unwrap();
        assert_eq!(result.sentiment, "neutral");
    }

    #[test]
    fn test_empty_input_is_unavailable() {
        let analyzer = LexiconSentiment::new();
        assert!(analyzer.analyze("   ").is_err());
    }
}
