//! Chunk-and-average document scoring.

use crate::models::AggregateResult;
use crate::services::metrics;
use crate::services::providers::{ProviderError, SegmentScorer};
use crate::services::segmenter::segment;
use std::sync::Arc;
use std::time::Instant;

/// Scores a document by averaging the signed scores of its segments.
pub struct SentimentAggregator {
    scorer: Arc<dyn SegmentScorer>,
    max_segment_chars: usize,
}

impl SentimentAggregator {
    pub fn new(scorer: Arc<dyn SegmentScorer>, max_segment_chars: usize) -> Self {
        Self {
            scorer,
            max_segment_chars,
        }
    }

    /// Segment `text`, score each segment in order and average the scores.
    ///
    /// Segments are scored one at a time. The first scorer failure aborts
    /// the whole document; scores already collected are dropped. Text with
    /// no segments averages to a neutral zero.
    pub async fn aggregate(&self, text: &str) -> Result<AggregateResult, ProviderError> {
        let segments = segment(text, self.max_segment_chars);
        let provider = self.scorer.name();
        let mut scores = Vec::with_capacity(segments.len());

        for (index, seg) in segments.iter().enumerate() {
            let start = Instant::now();
            let result = self.scorer.score_one(seg).await;
            metrics::record_provider_latency(provider, start.elapsed().as_secs_f64());

            let score = result.map_err(|e| {
                metrics::record_provider_error(provider, e.kind());
                tracing::warn!(
                    provider,
                    segment = index,
                    segments = segments.len(),
                    error = %e,
                    "Segment scoring failed"
                );
                e
            })?;

            if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
                metrics::record_provider_error(provider, "invalid_response");
                return Err(ProviderError::InvalidResponse(format!(
                    "Segment score {} outside [-1, 1]",
                    score
                )));
            }

            scores.push(score);
        }

        metrics::record_segments_scored(provider, scores.len());

        let result = AggregateResult::from_scores(&scores);
        tracing::debug!(
            segments = scores.len(),
            score = result.sentiment_score,
            sentiment = %result.sentiment,
            "Aggregated document sentiment"
        );

        Ok(result)
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.scorer.health_check().await
    }
}
