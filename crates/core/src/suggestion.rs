//! Suggestion and sentiment types
//!
//! A session always has exactly one current suggestion. Suggestions are
//! replaced wholesale on each advice response (or fallback) and never
//! partially updated.

use serde::{Deserialize, Serialize};

use crate::stage::SalesStage;

/// Caller sentiment as estimated by the advice service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Hesitant,
    Negative,
}

impl Sentiment {
    /// Parse a wire value, coercing anything unknown to neutral.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "positive" => Sentiment::Positive,
            "neutral" => Sentiment::Neutral,
            "hesitant" => Sentiment::Hesitant,
            "negative" => Sentiment::Negative,
            other => {
                tracing::debug!("Unknown sentiment '{}', coercing to neutral", other);
                Sentiment::Neutral
            },
        }
    }
}

/// One "say this next" suggestion for the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The exact words to say next
    pub text: String,
    /// Stage estimate that accompanied this suggestion
    pub stage: SalesStage,
    /// Quick tactical tip
    pub tip: String,
    /// Estimated sentiment of the other party
    pub sentiment: Sentiment,
}

impl Suggestion {
    /// The fixed opening line shown when a call starts or resets.
    pub fn opening() -> Self {
        Self {
            text: "Hi! Thanks for picking up. Do you have a quick moment?".to_string(),
            stage: SalesStage::Greeting,
            tip: "Be warm and ask permission to talk".to_string(),
            sentiment: Sentiment::Neutral,
        }
    }

    /// The fixed local fallback used whenever the advice service cannot be
    /// reached or parsed. Keeps the previous stage so the coaching flow never
    /// regresses on a failure.
    pub fn fallback(stage: SalesStage) -> Self {
        Self {
            text: "That's interesting, tell me more about that.".to_string(),
            stage,
            tip: "Keep them talking".to_string(),
            sentiment: Sentiment::Neutral,
        }
    }
}
