//! LLM-backed news sentiment (generative variant).

use crate::error::AnalyzeError;
use crate::services::metrics;
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use std::sync::Arc;
use std::time::Instant;

pub const SENTIMENT_TOKEN: &str = "sentiment:";
pub const SCORE_TOKEN: &str = "sentiment-score:";

/// Asks a text provider for a two-line sentiment verdict on a news item.
pub struct NewsAnalyzer {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl NewsAnalyzer {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            params: GenerationParams {
                temperature: Some(0.0),
                max_tokens: Some(64),
            },
        }
    }

    /// Returns the model output unchanged once both tokens are present.
    pub async fn analyze(&self, text: &str, ticker: &str) -> Result<String, AnalyzeError> {
        let prompt = build_prompt(text, ticker);
        let provider = self.provider.name();

        let start = Instant::now();
        let result = self.provider.generate(&prompt, &self.params).await;
        metrics::record_provider_latency(provider, start.elapsed().as_secs_f64());

        let output = result.map_err(|e| {
            metrics::record_provider_error(provider, e.kind());
            tracing::warn!(provider, ticker, error = %e, "Text generation failed");
            e
        })?;

        check_format(&output)?;
        Ok(output)
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }
}

/// Prompt instructing the model to reply in the two-line format.
pub fn build_prompt(text: &str, ticker: &str) -> String {
    format!(
        "You are a financial news sentiment analyst.\n\
         Assess the sentiment of the following news for the stock {ticker}.\n\
         Reply with exactly two lines and nothing else:\n\
         {SENTIMENT_TOKEN}<positive|negative|neutral>\n\
         {SCORE_TOKEN}<confidence between 0 and 1>\n\
         \n\
         News:\n\
         {text}"
    )
}

/// Both tokens must appear in the output, in any letter case.
pub fn check_format(output: &str) -> Result<(), AnalyzeError> {
    let lower = output.to_lowercase();

    for token in [SENTIMENT_TOKEN, SCORE_TOKEN] {
        if !lower.contains(token) {
            tracing::error!(missing = token, output, "Model output missing required token");
            return Err(AnalyzeError::Format(format!("missing '{}'", token)));
        }
    }

    Ok(())
}
