use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::error::AnalyzeError;
use crate::services::metrics::AnalyzeTimer;
use crate::services::{NewsAnalyzer, SentimentAggregator};

/// Validation failures answer HTTP 200 with an `error` body. Existing
/// clients key off these exact strings.
pub const EMPTY_TEXT_ERROR: &str = "Text cannot be empty";
pub const EMPTY_NEWS_ERROR: &str = "News text and ticker symbol cannot be empty";
pub const INVALID_TICKER_ERROR: &str = "Ticker symbol must be at most 32 characters";

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeNewsRequest {
    pub text: String,
    #[validate(length(max = 32))]
    pub ticker: String,
}

impl AnalyzeNewsRequest {
    /// Copy with surrounding whitespace removed from both fields.
    fn trimmed(&self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            ticker: self.ticker.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerativeResponse {
    pub result: String,
}

fn validation_error(message: &str) -> Response {
    Json(json!({ "error": message })).into_response()
}

/// `POST /analyze` for the classifier variant.
#[tracing::instrument(skip_all)]
pub async fn analyze_text(
    State(aggregator): State<Arc<SentimentAggregator>>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Response, AnalyzeError> {
    let timer = AnalyzeTimer::start("classifier");

    if request.text.trim().is_empty() {
        timer.finish("validation_error");
        return Ok(validation_error(EMPTY_TEXT_ERROR));
    }

    match aggregator.aggregate(&request.text).await {
        Ok(result) => {
            timer.finish("ok");
            tracing::info!(
                text_len = request.text.len(),
                score = result.sentiment_score,
                sentiment = %result.sentiment,
                "Text analyzed"
            );
            Ok(Json(result).into_response())
        }
        Err(e) => {
            let err = AnalyzeError::from(e);
            timer.finish(err.outcome());
            tracing::error!(error = %err, "Sentiment analysis failed");
            Err(err)
        }
    }
}

/// `POST /analyze` for the generative variant.
#[tracing::instrument(skip_all)]
pub async fn analyze_news(
    State(analyzer): State<Arc<NewsAnalyzer>>,
    Json(request): Json<AnalyzeNewsRequest>,
) -> Result<Response, AnalyzeError> {
    let timer = AnalyzeTimer::start("generative");
    let trimmed = request.trimmed();

    if trimmed.text.is_empty() || trimmed.ticker.is_empty() {
        timer.finish("validation_error");
        return Ok(validation_error(EMPTY_NEWS_ERROR));
    }

    if trimmed.validate().is_err() {
        timer.finish("validation_error");
        return Ok(validation_error(INVALID_TICKER_ERROR));
    }

    let ticker = trimmed.ticker.to_uppercase();

    match analyzer.analyze(&request.text, &ticker).await {
        Ok(output) => {
            timer.finish("ok");
            tracing::info!(
                ticker = %ticker,
                text_len = request.text.len(),
                "News analyzed"
            );
            Ok(Json(GenerativeResponse { result: output }).into_response())
        }
        Err(err) => {
            timer.finish(err.outcome());
            tracing::error!(error = %err, "News analysis failed");
            Err(err)
        }
    }
}
