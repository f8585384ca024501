//! Application startup and lifecycle management.
//!
//! Providers are built once here and handed to the handlers through
//! [`AppState`]; tests swap in mocks via [`Application::build_with_analyzer`].

use crate::config::{ProviderMode, SentimentConfig, Variant};
use crate::handlers;
use crate::services::metrics::init_metrics;
use crate::services::providers::classifier::ClassifierScorer;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::{MockScorer, MockTextProvider};
use crate::services::providers::{ProviderError, SegmentScorer, TextProvider};
use crate::services::{NewsAnalyzer, SentimentAggregator};
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// The analysis backend behind `/analyze`.
#[derive(Clone)]
pub enum Analyzer {
    Classifier(Arc<SentimentAggregator>),
    Generative(Arc<NewsAnalyzer>),
}

impl Analyzer {
    /// Build the analyzer selected by configuration.
    pub fn from_config(config: &SentimentConfig) -> Result<Self, AppError> {
        let analyzer = match (config.variant, config.provider) {
            (Variant::Classifier, ProviderMode::Live) => {
                let scorer = ClassifierScorer::new(config.classifier.clone())
                    .map_err(provider_init_error)?;
                tracing::info!(
                    url = %config.classifier.url,
                    model = %config.classifier.model,
                    "Initialized classifier scorer"
                );
                Self::classifier(Arc::new(scorer), config.segment_max_chars)
            }
            (Variant::Classifier, ProviderMode::Mock) => {
                tracing::info!("Classifier provider set to mock, using mock scorer");
                Self::classifier(Arc::new(MockScorer::default()), config.segment_max_chars)
            }
            (Variant::Generative, ProviderMode::Live) => {
                let provider = GeminiTextProvider::new(GeminiConfig {
                    api_key: config.google.api_key.clone(),
                    model: config.models.text_model.clone(),
                    api_base: config.google.api_base.clone(),
                    timeout_secs: config.models.timeout_secs,
                })
                .map_err(provider_init_error)?;
                tracing::info!(
                    model = %config.models.text_model,
                    "Initialized Gemini text provider"
                );
                Self::generative(Arc::new(provider))
            }
            (Variant::Generative, ProviderMode::Mock) => {
                tracing::info!("Generative provider set to mock, using mock text provider");
                Self::generative(Arc::new(MockTextProvider::default()))
            }
        };

        Ok(analyzer)
    }

    pub fn classifier(scorer: Arc<dyn SegmentScorer>, max_segment_chars: usize) -> Self {
        Analyzer::Classifier(Arc::new(SentimentAggregator::new(
            scorer,
            max_segment_chars,
        )))
    }

    pub fn generative(provider: Arc<dyn TextProvider>) -> Self {
        Analyzer::Generative(Arc::new(NewsAnalyzer::new(provider)))
    }

    pub fn variant(&self) -> Variant {
        match self {
            Analyzer::Classifier(_) => Variant::Classifier,
            Analyzer::Generative(_) => Variant::Generative,
        }
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        match self {
            Analyzer::Classifier(aggregator) => aggregator.health_check().await,
            Analyzer::Generative(analyzer) => analyzer.health_check().await,
        }
    }
}

fn provider_init_error(err: ProviderError) -> AppError {
    tracing::error!("Failed to initialize provider: {}", err);
    AppError::ConfigError(anyhow::Error::new(err))
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SentimentConfig,
    pub analyzer: Analyzer,
}

/// Build the HTTP router for the configured variant.
pub fn router(state: AppState) -> Router {
    let analyze_router = match state.analyzer.clone() {
        Analyzer::Classifier(aggregator) => Router::new()
            .route("/analyze", post(handlers::analyze_text))
            .with_state(aggregator),
        Analyzer::Generative(analyzer) => Router::new()
            .route("/analyze", post(handlers::analyze_news))
            .with_state(analyzer),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .merge(analyze_router)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the providers named in `config`.
    pub async fn build(config: SentimentConfig) -> Result<Self, AppError> {
        let analyzer = Analyzer::from_config(&config)?;
        Self::build_with_analyzer(config, analyzer).await
    }

    /// Build the application around an already constructed analyzer.
    pub async fn build_with_analyzer(
        config: SentimentConfig,
        analyzer: Analyzer,
    ) -> Result<Self, AppError> {
        init_metrics().map_err(|e| {
            tracing::error!("Failed to initialize metrics: {}", e);
            AppError::InternalError(anyhow::Error::new(e))
        })?;

        if analyzer.variant() != config.variant {
            tracing::warn!(
                configured = config.variant.as_str(),
                actual = analyzer.variant().as_str(),
                "Analyzer does not match configured variant"
            );
        }

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            variant = analyzer.variant().as_str(),
            "Sentiment service: HTTP on port {}",
            http_port
        );

        Ok(Self {
            http_port,
            http_listener,
            state: AppState { config, analyzer },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = router(self.state);

        axum::serve(self.http_listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
