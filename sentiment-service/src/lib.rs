//! sentiment-service: scores financial news text through an external model.
//!
//! Two variants share this crate. The classifier variant splits text into
//! bounded segments, scores each one with a sentiment classification model
//! and averages the signed scores. The generative variant asks a hosted LLM
//! for a formatted verdict and passes it through after a format check.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
