//! Sentiment classification model provider.
//!
//! Scores segments through a text-classification inference server (a local
//! Text Embeddings Inference `/predict` route, or the Hugging Face inference
//! API) serving a FinBERT-style model.

use super::{Classification, ProviderError, SegmentScorer};
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text classified by the readiness check.
const HEALTH_CHECK_TEXT: &str = "Markets opened flat.";

/// Classification-model backed scorer.
pub struct ClassifierScorer {
    config: ClassifierConfig,
    client: Client,
}

impl ClassifierScorer {
    pub fn new(config: ClassifierConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Run the model on one segment and return its top prediction.
    pub async fn classify(&self, segment: &str) -> Result<Classification, ProviderError> {
        let request = ClassifyRequest { inputs: segment };

        tracing::debug!(
            model = %self.config.model,
            segment_len = segment.len(),
            "Sending segment to classification model"
        );

        let mut builder = self.client.post(&self.config.url).json(&request);
        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.config.timeout_secs))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Classifier error {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.config.timeout_secs))?;

        parse_classification(&body)
    }
}

#[async_trait]
impl SegmentScorer for ClassifierScorer {
    async fn score_one(&self, segment: &str) -> Result<f64, ProviderError> {
        let classification = self.classify(segment).await?;
        Ok(classification.signed_score())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.url.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Classifier URL not configured".to_string(),
            ));
        }

        self.classify(HEALTH_CHECK_TEXT).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "classifier"
    }
}

/// Pick the top label out of an inference server response body.
///
/// Accepts `[{label, score}, ..]`, `[[{label, score}, ..]]` and a bare
/// `{label, score}` object.
pub fn parse_classification(body: &str) -> Result<Classification, ProviderError> {
    let parsed: ClassifyResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let candidates = match parsed {
        ClassifyResponse::Batched(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
        ClassifyResponse::Flat(labels) => labels,
        ClassifyResponse::Single(label) => vec![label],
    };

    let top = candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| ProviderError::InvalidResponse("No labels in response".to_string()))?;

    if !top.score.is_finite() || !(0.0..=1.0).contains(&top.score) {
        return Err(ProviderError::InvalidResponse(format!(
            "Confidence {} outside [0, 1]",
            top.score
        )));
    }

    Ok(Classification {
        label: top.label.to_ascii_lowercase(),
        confidence: top.score,
    })
}

// ============================================================================
// Inference API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Single(LabelScore),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Router};
    use tokio::net::TcpListener;

    fn config(url: String) -> ClassifierConfig {
        ClassifierConfig {
            url,
            model: "ProsusAI/finbert".to_string(),
            api_token: None,
            timeout_secs: 1,
        }
    }

    /// Serve `router` on a random local port and return its `/predict` URL.
    async fn spawn_stub(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{}/predict", addr)
    }

    #[test]
    fn test_parse_flat_response() {
        let body = r#"[{"label":"positive","score":0.92},{"label":"neutral","score":0.05},{"label":"negative","score":0.03}]"#;
        let c = parse_classification(body).unwrap();
        assert_eq!(c.label, "positive");
        assert_eq!(c.confidence, 0.92);
        assert_eq!(c.signed_score(), 0.92);
    }

    #[test]
    fn test_parse_batched_response_picks_top_label() {
        let body = r#"[[{"label":"neutral","score":0.2},{"label":"Negative","score":0.75},{"label":"positive","score":0.05}]]"#;
        let c = parse_classification(body).unwrap();
        assert_eq!(c.label, "negative");
        assert_eq!(c.signed_score(), -0.75);
    }

    #[test]
    fn test_parse_single_object() {
        let c = parse_classification(r#"{"label":"neutral","score":0.6}"#).unwrap();
        assert_eq!(c.signed_score(), -0.6);
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert!(matches!(
            parse_classification("[]"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_classification("[[]]"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_classification(r#"{"error":"model loading"}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let result = parse_classification(r#"[{"label":"positive","score":1.7}]"#);
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_empty_url_fails_health_check() {
        let scorer = ClassifierScorer::new(config(String::new())).unwrap();

        let result = scorer.health_check().await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_scores_segment_from_server() {
        let url = spawn_stub(Router::new().route(
            "/predict",
            post(|| async { r#"[{"label":"negative","score":0.8},{"label":"positive","score":0.2}]"# }),
        ))
        .await;
        let scorer = ClassifierScorer::new(config(url)).unwrap();

        assert_eq!(scorer.score_one("Profit warning").await.unwrap(), -0.8);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/predict", listener.local_addr().unwrap());
        // Accept connections and hold them open without answering.
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let scorer = ClassifierScorer::new(config(url)).unwrap();
        let result = scorer.score_one("Shares slid").await;

        assert!(matches!(result, Err(ProviderError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_too_many_requests_maps_to_rate_limited() {
        let url = spawn_stub(Router::new().route(
            "/predict",
            post(|| async { StatusCode::TOO_MANY_REQUESTS }),
        ))
        .await;
        let scorer = ClassifierScorer::new(config(url)).unwrap();

        let result = scorer.score_one("Shares slid").await;
        assert!(matches!(result, Err(ProviderError::RateLimited)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let url = spawn_stub(Router::new().route(
            "/predict",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        ))
        .await;
        let scorer = ClassifierScorer::new(config(url)).unwrap();

        match scorer.score_one("Shares slid").await {
            Err(ProviderError::ApiError(msg)) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("model loading"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }
}
