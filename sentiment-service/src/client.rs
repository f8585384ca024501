//! Typed client for the generative `/analyze` endpoint.
//!
//! Trims and bounds the request, parses the two-line model verdict into an
//! [`AggregateResult`], and degrades to a neutral result on any failure so
//! callers rendering news feeds never block on sentiment.

use crate::handlers::analyze::GenerativeResponse;
use crate::models::{AggregateResult, Sentiment};
use crate::services::news_analyzer::{SCORE_TOKEN, SENTIMENT_TOKEN};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Ticker sent when the caller has none.
pub const DEFAULT_TICKER: &str = "general market";

const MAX_TEXT_CHARS: usize = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sentiment service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from sentiment service")]
    MissingResult,

    #[error("Failed to parse sentiment analysis result: {0}")]
    Unparseable(String),
}

#[derive(Debug, Serialize)]
struct AnalyzeNewsBody<'a> {
    text: &'a str,
    ticker: &'a str,
}

/// Client for a sentiment-service running the generative variant.
#[derive(Clone)]
pub struct SentimentClient {
    endpoint: String,
    client: Client,
}

impl SentimentClient {
    /// `base_url` is the service root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            endpoint: format!("{}/analyze", base_url.trim_end_matches('/')),
            client,
        })
    }

    /// Analyze `text`, falling back to neutral on any error.
    pub async fn analyze_sentiment(&self, text: &str, ticker: Option<&str>) -> AggregateResult {
        match self.try_analyze(text, ticker).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    url = %self.endpoint,
                    ticker = ticker.unwrap_or(DEFAULT_TICKER),
                    "Sentiment analysis failed, returning neutral"
                );
                AggregateResult::neutral()
            }
        }
    }

    /// Analyze `text`, surfacing every failure.
    pub async fn try_analyze(
        &self,
        text: &str,
        ticker: Option<&str>,
    ) -> Result<AggregateResult, ClientError> {
        let clean_text = clean_text(text).ok_or(ClientError::EmptyText)?;
        let clean_ticker = clean_ticker(ticker);

        tracing::info!(
            ticker = %clean_ticker,
            text_len = clean_text.chars().count(),
            "Requesting sentiment analysis"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&AnalyzeNewsBody {
                text: clean_text,
                ticker: &clean_ticker,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        let result = serde_json::from_value::<GenerativeResponse>(body)
            .ok()
            .map(|r| r.result)
            .filter(|r| !r.is_empty())
            .ok_or(ClientError::MissingResult)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sentiment analysis completed"
        );

        parse_generated_sentiment(&result)
    }
}

/// Trimmed text, capped at 10 000 characters; `None` when blank.
fn clean_text(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => Some(&trimmed[..idx]),
        None => Some(trimmed),
    }
}

fn clean_ticker(ticker: Option<&str>) -> String {
    ticker
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TICKER)
        .to_uppercase()
}

/// Parse `sentiment:<label>` and `sentiment-score:<number>` out of model
/// output. Matching is case-insensitive; the score keeps four decimals.
pub fn parse_generated_sentiment(output: &str) -> Result<AggregateResult, ClientError> {
    // ASCII lowercasing keeps byte offsets aligned with `output`.
    let lower = output.to_ascii_lowercase();

    let sentiment = lower
        .match_indices(SENTIMENT_TOKEN)
        .find_map(|(idx, _)| {
            let rest = &lower[idx + SENTIMENT_TOKEN.len()..];
            ["positive", "negative", "neutral"]
                .into_iter()
                .find(|label| rest.starts_with(label))
        })
        .and_then(|label| label.parse::<Sentiment>().ok())
        .ok_or_else(|| ClientError::Unparseable(output.to_string()))?;

    let score = lower
        .match_indices(SCORE_TOKEN)
        .find_map(|(idx, _)| leading_decimal(&lower[idx + SCORE_TOKEN.len()..]))
        .ok_or_else(|| ClientError::Unparseable(output.to_string()))?;

    let score: f64 = score
        .parse()
        .map_err(|_| ClientError::Unparseable(format!("invalid score '{}'", score)))?;

    Ok(AggregateResult {
        sentiment_score: (score * 10_000.0).round() / 10_000.0,
        sentiment,
    })
}

/// Longest prefix of `s` that reads as an unsigned decimal: digits, then at
/// most one `.` with the digits after it. Trailing text such as a closing
/// period is ignored.
fn leading_decimal(s: &str) -> Option<&str> {
    let int_len = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut end = int_len;

    if let Some(frac) = s[int_len..].strip_prefix('.') {
        let frac_len = frac
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(frac.len());
        if frac_len > 0 {
            end = int_len + 1 + frac_len;
        }
    }

    (end > 0).then(|| &s[..end])
}
