use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document-level sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Label by sign: above zero is positive, below is negative, zero is neutral.
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Sentiment::Positive
        } else if score < 0.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(format!("Unknown sentiment label: {}", other)),
        }
    }
}

/// Final document-level score and label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub sentiment_score: f64,
    pub sentiment: Sentiment,
}

impl AggregateResult {
    /// Arithmetic mean of `scores`; an empty slice averages to zero.
    pub fn from_scores(scores: &[f64]) -> Self {
        let avg = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            sentiment_score: avg,
            sentiment: Sentiment::from_score(avg),
        }
    }

    pub fn neutral() -> Self {
        Self {
            sentiment_score: 0.0,
            sentiment: Sentiment::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_follows_sign() {
        assert_eq!(Sentiment::from_score(0.0001), Sentiment::Positive);
        assert_eq!(Sentiment::from_score(-0.0001), Sentiment::Negative);
        assert_eq!(Sentiment::from_score(0.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_score(-0.0), Sentiment::Neutral);
    }

    #[test]
    fn test_mean_of_scores() {
        let result = AggregateResult::from_scores(&[0.5, -0.3, 0.1]);
        assert!((result.sentiment_score - 0.1).abs() < 1e-9);
        assert_eq!(result.sentiment, Sentiment::Positive);

        let tie = AggregateResult::from_scores(&[0.4, -0.4]);
        assert_eq!(tie.sentiment_score, 0.0);
        assert_eq!(tie.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_empty_scores_are_neutral() {
        assert_eq!(AggregateResult::from_scores(&[]), AggregateResult::neutral());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(AggregateResult::from_scores(&[0.92])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "sentiment_score": 0.92, "sentiment": "positive" })
        );
    }

    #[test]
    fn test_parse_label() {
        assert_eq!("NEGATIVE".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("bullish".parse::<Sentiment>().is_err());
    }
}
