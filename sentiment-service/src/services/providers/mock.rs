//! Mock provider implementations for testing and local development.

use super::{GenerationParams, ProviderError, SegmentScorer, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned generative output in the expected two-line format.
pub const MOCK_GENERATED_OUTPUT: &str = "sentiment:neutral\nsentiment-score:0.5";

/// Deterministic segment scorer.
///
/// Returns `scores` in order, cycling when there are more segments than
/// scores, and records every segment it was asked to score.
pub struct MockScorer {
    scores: Vec<f64>,
    fail_at: Option<usize>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockScorer {
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores,
            fail_at: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fail the call with the given zero-based index.
    pub fn failing_at(mut self, call_index: usize) -> Self {
        self.fail_at = Some(call_index);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Segments received so far, in call order.
    pub fn seen_segments(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new(vec![0.0])
    }
}

#[async_trait]
impl SegmentScorer for MockScorer {
    async fn score_one(&self, segment: &str) -> Result<f64, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(segment.to_string());
        }

        if self.fail_at == Some(index) {
            return Err(ProviderError::ApiError(format!(
                "Mock scorer failure on segment {}",
                index
            )));
        }

        if self.scores.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Mock scorer has no scores".to_string(),
            ));
        }

        Ok(self.scores[index % self.scores.len()])
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Mock text provider returning a fixed completion.
pub struct MockTextProvider {
    output: Result<String, String>,
    last_prompt: Mutex<Option<String>>,
}

impl MockTextProvider {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: Ok(output.into()),
            last_prompt: Mutex::new(None),
        }
    }

    /// Provider whose every call fails with an API error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            output: Err(message.into()),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new(MOCK_GENERATED_OUTPUT)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        self.output.clone().map_err(ProviderError::ApiError)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.output {
            Ok(_) => Ok(()),
            Err(msg) => Err(ProviderError::ApiError(msg.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scores_cycle_in_order() {
        let scorer = MockScorer::new(vec![0.5, -0.3]);
        assert_eq!(scorer.score_one("a").await.unwrap(), 0.5);
        assert_eq!(scorer.score_one("b").await.unwrap(), -0.3);
        assert_eq!(scorer.score_one("c").await.unwrap(), 0.5);
        assert_eq!(scorer.call_count(), 3);
        assert_eq!(scorer.seen_segments(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fails_at_requested_call() {
        let scorer = MockScorer::new(vec![0.1]).failing_at(1);
        assert!(scorer.score_one("a").await.is_ok());
        assert!(matches!(
            scorer.score_one("b").await,
            Err(ProviderError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_text_provider_records_prompt() {
        let provider = MockTextProvider::default();
        let output = provider
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(output, MOCK_GENERATED_OUTPUT);
        assert_eq!(provider.last_prompt().as_deref(), Some("prompt"));

        let failing = MockTextProvider::failing("quota exceeded");
        assert!(failing
            .generate("prompt", &GenerationParams::default())
            .await
            .is_err());
        assert!(failing.health_check().await.is_err());
    }
}
