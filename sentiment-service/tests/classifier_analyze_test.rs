//! `/analyze` behaviour for the classifier variant.

mod common;

use common::{test_config, TestApp};
use sentiment_service::config::{ProviderMode, Variant};
use sentiment_service::handlers::analyze::EMPTY_TEXT_ERROR;
use sentiment_service::startup::Analyzer;
use sentiment_service::services::providers::mock::MockScorer;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::test]
async fn single_segment_score_is_returned() {
    let scorer = Arc::new(MockScorer::new(vec![0.92]));
    let app = TestApp::spawn_classifier(scorer.clone()).await;

    let response = app
        .post_analyze(json!({ "text": "Company X beats earnings expectations" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "sentiment_score": 0.92, "sentiment": "positive" }));
    assert_eq!(scorer.call_count(), 1);
}

#[tokio::test]
async fn long_text_is_scored_per_segment_and_averaged() {
    let scorer = Arc::new(MockScorer::new(vec![0.5, -0.3, 0.1]));
    let app = TestApp::spawn_classifier(scorer.clone()).await;

    let text = "r".repeat(1200);
    let response = app.post_analyze(json!({ "text": text })).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let score = body["sentiment_score"].as_f64().unwrap();
    assert!((score - 0.1).abs() < 1e-9);
    assert_eq!(body["sentiment"], "positive");

    let lengths: Vec<usize> = scorer.seen_segments().iter().map(|s| s.len()).collect();
    assert_eq!(lengths, vec![500, 500, 200]);
}

#[tokio::test]
async fn negative_mean_is_labelled_negative() {
    let app = TestApp::spawn_classifier(Arc::new(MockScorer::new(vec![-0.8, 0.2]))).await;

    let response = app
        .post_analyze(json!({ "text": "d".repeat(700) }))
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sentiment"], "negative");
    assert!((body["sentiment_score"].as_f64().unwrap() + 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn blank_text_returns_error_body_with_200() {
    let scorer = Arc::new(MockScorer::new(vec![0.5]));
    let app = TestApp::spawn_classifier(scorer.clone()).await;

    for text in ["", "   ", "\n\t "] {
        let response = app.post_analyze(json!({ "text": text })).await;

        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": EMPTY_TEXT_ERROR }));
        assert!(body.get("sentiment_score").is_none());
    }

    assert_eq!(scorer.call_count(), 0);
}

#[tokio::test]
async fn scorer_failure_returns_500_with_detail() {
    let scorer = Arc::new(MockScorer::new(vec![0.4]).failing_at(1));
    let app = TestApp::spawn_classifier(scorer.clone()).await;

    let response = app
        .post_analyze(json!({ "text": "f".repeat(1100) }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Mock scorer failure on segment 1"));
    assert!(body.get("sentiment_score").is_none());
    // The third segment is never scored once the second fails
    assert_eq!(scorer.call_count(), 2);
}

#[tokio::test]
async fn missing_text_field_is_rejected() {
    let app = TestApp::spawn_classifier(Arc::new(MockScorer::default())).await;

    let response = app.post_analyze(json!({ "body": "no text here" })).await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn unresponsive_classifier_times_out_with_500() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/predict", listener.local_addr().unwrap());
    // Accept connections and never answer.
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    let mut config = test_config(Variant::Classifier);
    config.provider = ProviderMode::Live;
    config.classifier.url = url;
    config.classifier.timeout_secs = 1;
    let analyzer = Analyzer::from_config(&config).expect("Failed to build live classifier");
    let app = TestApp::spawn_with(config, analyzer).await;

    let response = app
        .post_analyze(json!({ "text": "Guidance withdrawn" }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Request timed out after 1s");
}
