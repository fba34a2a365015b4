//! Advice service backend
//!
//! Wire types for the advice service and the HTTP implementation. The backend
//! makes exactly one attempt per request; recovery (fallback suggestions) is
//! the [`SuggestionClient`](crate::client::SuggestionClient)'s job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use call_coach_config::AdviceConfig;
use call_coach_core::SalesStage;

use crate::extract::extract_json_object;
use crate::AdviceError;

/// One prior exchange sent as conversation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// "caller" or "suggestion"
    pub role: String,
    pub text: String,
}

/// Request body for the advice service
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRequest {
    /// The utterance the caller just finished
    pub transcript: String,
    /// What the user wants out of the call
    pub goal: String,
    /// Resolved style text (keyword or custom free text)
    pub style: String,
    pub current_stage: SalesStage,
    /// Bounded recent history, oldest first
    pub conversation_history: Vec<HistoryTurn>,
}

/// Parsed advice response, before stage/sentiment coercion
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAdvice {
    /// The exact words to say next
    pub suggestion: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub tip: Option<String>,
    #[serde(default)]
    pub caller_sentiment: Option<String>,
}

/// An advice service backend. One attempt per call, no internal retry.
#[async_trait]
pub trait AdviceBackend: Send + Sync {
    async fn suggest(&self, request: &AdviceRequest) -> Result<RawAdvice, AdviceError>;
}

/// HTTP backend for the advice service
pub struct HttpAdviceBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAdviceBackend {
    /// Build from configuration. The request timeout is applied at the client
    /// level so a stalled round trip resolves instead of hanging.
    pub fn new(config: &AdviceConfig) -> Result<Self, AdviceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AdviceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn parse_body(body: &str) -> Result<RawAdvice, AdviceError> {
        let object = extract_json_object(body)
            .ok_or_else(|| AdviceError::InvalidResponse("no JSON object in body".to_string()))?;

        let advice: RawAdvice = serde_json::from_str(object)
            .map_err(|e| AdviceError::InvalidResponse(e.to_string()))?;

        if advice.suggestion.trim().is_empty() {
            return Err(AdviceError::InvalidResponse(
                "empty suggestion field".to_string(),
            ));
        }
        Ok(advice)
    }
}

#[async_trait]
impl AdviceBackend for HttpAdviceBackend {
    async fn suggest(&self, request: &AdviceRequest) -> Result<RawAdvice, AdviceError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdviceError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdviceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Read as text first: the payload may be wrapped in prose.
        let body = response.text().await?;
        Self::parse_body(&body)
    }
}
