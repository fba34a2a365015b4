//! Advice service integration
//!
//! Features:
//! - HTTP backend with bounded request timeout and bearer auth
//! - Best-effort JSON extraction from prose-wrapped model output
//! - Stage/sentiment coercion for out-of-vocabulary values
//! - Deterministic local fallback: the coaching flow is never left without a
//!   suggestion

pub mod backend;
pub mod client;
pub mod extract;

pub use backend::{AdviceBackend, AdviceRequest, HistoryTurn, HttpAdviceBackend, RawAdvice};
pub use client::{AdviceContext, SuggestionClient, SuggestionOutcome};
pub use extract::extract_json_object;

use thiserror::Error;

/// Advice service errors. All of these are absorbed by
/// [`SuggestionClient`] into the local fallback; none reach the caller.
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Advice service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited by advice service")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AdviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdviceError::Timeout
        } else {
            AdviceError::Network(err.to_string())
        }
    }
}
