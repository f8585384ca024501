use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Segment length observed for the classifier model (its 512 token window).
pub const DEFAULT_SEGMENT_MAX_CHARS: usize = 500;

const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GENAI_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// Which `/analyze` contract this process serves.
    pub variant: Variant,
    /// Live providers or deterministic mocks.
    pub provider: ProviderMode,
    pub classifier: ClassifierConfig,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub segment_max_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Classifier,
    Generative,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classifier => "classifier",
            Variant::Generative => "generative",
        }
    }
}

impl FromStr for Variant {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classifier" | "finbert" => Ok(Variant::Classifier),
            "generative" | "gemini" => Ok(Variant::Generative),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "SENTIMENT_VARIANT must be 'classifier' or 'generative', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Live,
    Mock,
}

impl FromStr for ProviderMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(ProviderMode::Live),
            "mock" => Ok(ProviderMode::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "SENTIMENT_PROVIDER must be 'live' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Text-classification inference endpoint (e.g. a local TEI `/predict`).
    pub url: String,
    /// Model identifier, informational for local servers.
    pub model: String,
    /// Bearer token for hosted inference endpoints.
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model for the generative variant (e.g., gemini-2.0-flash)
    pub text_model: String,
    pub timeout_secs: u64,
}

impl SentimentConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let config = SentimentConfig {
            common: common_config,
            variant: get_env("SENTIMENT_VARIANT", Some("classifier"), is_prod)?.parse()?,
            provider: get_env("SENTIMENT_PROVIDER", Some("live"), is_prod)?.parse()?,
            classifier: ClassifierConfig {
                url: get_env(
                    "CLASSIFIER_URL",
                    Some("http://localhost:8000/predict"),
                    is_prod,
                )?,
                model: get_env("CLASSIFIER_MODEL", Some("ProsusAI/finbert"), is_prod)?,
                api_token: env::var("CLASSIFIER_API_TOKEN")
                    .ok()
                    .filter(|t| !t.trim().is_empty()),
                timeout_secs: parse_env(
                    "SCORER_TIMEOUT_SECS",
                    DEFAULT_SCORER_TIMEOUT_SECS,
                    is_prod,
                )?,
            },
            google: GoogleConfig {
                api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
                api_base: get_env("GENAI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
            },
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                timeout_secs: parse_env("GENAI_TIMEOUT_SECS", DEFAULT_GENAI_TIMEOUT_SECS, is_prod)?,
            },
            segment_max_chars: parse_env(
                "SEGMENT_MAX_CHARS",
                DEFAULT_SEGMENT_MAX_CHARS,
                is_prod,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would only fail later, per request.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.segment_max_chars == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SEGMENT_MAX_CHARS must be greater than zero"
            )));
        }

        if self.provider == ProviderMode::Live {
            match self.variant {
                Variant::Classifier if self.classifier.url.trim().is_empty() => {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "CLASSIFIER_URL is required for the classifier variant"
                    )));
                }
                Variant::Generative if self.google.api_key.trim().is_empty() => {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "GOOGLE_API_KEY is required for the generative variant"
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(&default.to_string()), is_prod)?
        .trim()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is not valid: {}", key, e)))
}
