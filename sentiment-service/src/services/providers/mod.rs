//! External inference provider abstractions and implementations.
//!
//! The classifier variant talks to a [`SegmentScorer`]; the generative
//! variant talks to a [`TextProvider`]. Both have a live HTTP-backed
//! implementation and a deterministic mock.

pub mod classifier;
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for the provider error metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::NetworkError(_) => "network_error",
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else {
            ProviderError::NetworkError(err.to_string())
        }
    }
}

/// One label prediction from a classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Model confidence in `label`, 0 to 1.
    pub confidence: f64,
}

impl Classification {
    /// `+confidence` for a positive label, `-confidence` for anything else.
    ///
    /// A `neutral` prediction therefore counts as negative; downstream
    /// consumers depend on this mapping.
    pub fn signed_score(&self) -> f64 {
        if self.label.eq_ignore_ascii_case("positive") {
            self.confidence
        } else {
            -self.confidence
        }
    }
}

/// Maps one text segment to a signed sentiment score in [-1, 1].
#[async_trait]
pub trait SegmentScorer: Send + Sync {
    async fn score_one(&self, segment: &str) -> Result<f64, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// Generation parameters for LLM requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a text completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_label_keeps_sign() {
        let c = Classification {
            label: "positive".to_string(),
            confidence: 0.92,
        };
        assert_eq!(c.signed_score(), 0.92);

        let upper = Classification {
            label: "POSITIVE".to_string(),
            confidence: 0.4,
        };
        assert_eq!(upper.signed_score(), 0.4);
    }

    #[test]
    fn test_other_labels_are_negated() {
        for label in ["negative", "neutral", "LABEL_2"] {
            let c = Classification {
                label: label.to_string(),
                confidence: 0.7,
            };
            assert_eq!(c.signed_score(), -0.7, "label {}", label);
        }
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ProviderError::RateLimited.kind(), "rate_limited");
        assert_eq!(ProviderError::Timeout(30).kind(), "timeout");
        assert_eq!(
            ProviderError::Timeout(30).to_string(),
            "Request timed out after 30s"
        );
    }
}
