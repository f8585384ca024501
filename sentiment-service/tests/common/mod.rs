#![allow(dead_code)]

use sentiment_service::config::{
    ClassifierConfig, GoogleConfig, ModelConfig, ProviderMode, SentimentConfig, Variant,
    DEFAULT_SEGMENT_MAX_CHARS,
};
use sentiment_service::services::providers::mock::{MockScorer, MockTextProvider};
use sentiment_service::startup::{Analyzer, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

pub fn test_config(variant: Variant) -> SentimentConfig {
    SentimentConfig {
        // Use random port for testing (port 0)
        common: CoreConfig {
            port: 0,
            ..CoreConfig::default()
        },
        variant,
        provider: ProviderMode::Mock,
        classifier: ClassifierConfig {
            url: "http://127.0.0.1:9/predict".to_string(),
            model: "ProsusAI/finbert".to_string(),
            api_token: None,
            timeout_secs: 1,
        },
        google: GoogleConfig {
            api_key: "test-api-key".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        },
        models: ModelConfig {
            text_model: "gemini-2.0-flash".to_string(),
            timeout_secs: 1,
        },
        segment_max_chars: DEFAULT_SEGMENT_MAX_CHARS,
    }
}

impl TestApp {
    pub async fn spawn_classifier(scorer: Arc<MockScorer>) -> Self {
        let config = test_config(Variant::Classifier);
        let analyzer = Analyzer::classifier(scorer, config.segment_max_chars);
        Self::spawn_with(config, analyzer).await
    }

    pub async fn spawn_generative(provider: Arc<MockTextProvider>) -> Self {
        let analyzer = Analyzer::generative(provider);
        Self::spawn_with(test_config(Variant::Generative), analyzer).await
    }

    pub async fn spawn_with(config: SentimentConfig, analyzer: Analyzer) -> Self {
        let app = Application::build_with_analyzer(config, analyzer)
            .await
            .expect("Failed to build test application");

        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_analyze(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/analyze", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }
}
