//! HTTP handlers for sentiment-service.

pub mod analyze;
pub mod health;

pub use analyze::{analyze_news, analyze_text};
pub use health::{health_check, metrics, not_found, readiness_check};
