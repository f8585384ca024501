pub mod sentiment;

pub use sentiment::{AggregateResult, Sentiment};
