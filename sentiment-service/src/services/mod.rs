pub mod aggregator;
pub mod metrics;
pub mod news_analyzer;
pub mod providers;
pub mod segmenter;

pub use aggregator::SentimentAggregator;
pub use news_analyzer::NewsAnalyzer;
pub use providers::{ProviderError, SegmentScorer, TextProvider};
