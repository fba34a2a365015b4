//! Suggestion client
//!
//! Wraps an [`AdviceBackend`] so the coaching flow always gets a suggestion:
//! any transport failure, rate limit, or malformed body resolves to the fixed
//! local fallback, surfaced only as an advisory message. Unknown stage or
//! sentiment values are coerced rather than rejected.

use std::sync::Arc;

use call_coach_core::{CallSettings, SalesStage, Sentiment, Suggestion, TranscriptLog};

use crate::backend::{AdviceBackend, AdviceRequest, HistoryTurn, RawAdvice};

/// Advisory shown when a request fell back locally.
const FALLBACK_ADVISORY: &str = "Connection issue. Still listening, trying again...";

/// Bounded context accompanying one suggestion request
#[derive(Debug, Clone)]
pub struct AdviceContext {
    pub goal: String,
    pub style_text: String,
    pub current_stage: SalesStage,
    /// Most recent transcript entries, oldest first, already bounded
    pub recent_history: Vec<HistoryTurn>,
}

impl AdviceContext {
    /// Build a context from the session's settings, stage, and transcript,
    /// keeping the last `window` entries.
    pub fn from_log(
        settings: &CallSettings,
        current_stage: SalesStage,
        log: &TranscriptLog,
        window: usize,
    ) -> Self {
        let recent_history = log
            .recent(window)
            .iter()
            .map(|entry| HistoryTurn {
                role: entry.role.as_str().to_string(),
                text: entry.text.clone(),
            })
            .collect();

        Self {
            goal: settings.goal.clone(),
            style_text: settings.resolved_style_text().to_string(),
            current_stage,
            recent_history,
        }
    }
}

/// Result of one suggestion request. Always carries a usable suggestion.
#[derive(Debug, Clone)]
pub struct SuggestionOutcome {
    pub suggestion: Suggestion,
    /// Non-blocking notice for the UI when the backend failed and the local
    /// fallback was used
    pub advisory: Option<String>,
}

/// Client that always resolves to a suggestion
pub struct SuggestionClient {
    backend: Arc<dyn AdviceBackend>,
    history_window: usize,
}

impl SuggestionClient {
    pub fn new(backend: Arc<dyn AdviceBackend>, history_window: usize) -> Self {
        Self {
            backend,
            history_window,
        }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Request a suggestion for `utterance`. One attempt; failures resolve to
    /// [`Suggestion::fallback`] with an advisory instead of propagating.
    pub async fn get_suggestion(
        &self,
        utterance: &str,
        context: &AdviceContext,
    ) -> SuggestionOutcome {
        let mut history = context.recent_history.clone();
        if history.len() > self.history_window {
            history.drain(..history.len() - self.history_window);
        }

        let request = AdviceRequest {
            transcript: utterance.to_string(),
            goal: context.goal.clone(),
            style: context.style_text.clone(),
            current_stage: context.current_stage,
            conversation_history: history,
        };

        match self.backend.suggest(&request).await {
            Ok(raw) => SuggestionOutcome {
                suggestion: coerce(raw, context.current_stage),
                advisory: None,
            },
            Err(e) => {
                tracing::warn!("Advice request failed, using local fallback: {}", e);
                SuggestionOutcome {
                    suggestion: Suggestion::fallback(context.current_stage),
                    advisory: Some(FALLBACK_ADVISORY.to_string()),
                }
            },
        }
    }
}

/// Turn a raw advice payload into a [`Suggestion`], coercing unknown stage
/// ids to the previous stage and unknown sentiments to neutral.
fn coerce(raw: RawAdvice, previous_stage: SalesStage) -> Suggestion {
    let stage = raw
        .stage
        .as_deref()
        .and_then(SalesStage::from_id)
        .unwrap_or(previous_stage);

    let sentiment = raw
        .caller_sentiment
        .as_deref()
        .map(Sentiment::from_wire)
        .unwrap_or_default();

    Suggestion {
        text: raw.suggestion,
        stage,
        tip: raw.tip.unwrap_or_default(),
        sentiment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdviceError;
    use async_trait::async_trait;

    struct FixedBackend(Result<RawAdvice, AdviceError>);

    #[async_trait]
    impl AdviceBackend for FixedBackend {
        async fn suggest(&self, _request: &AdviceRequest) -> Result<RawAdvice, AdviceError> {
            match &self.0 {
                Ok(raw) => Ok(raw.clone()),
                Err(AdviceError::RateLimited) => Err(AdviceError::RateLimited),
                Err(e) => Err(AdviceError::Network(e.to_string())),
            }
        }
    }

    struct CapturingBackend {
        seen: std::sync::Mutex<Option<AdviceRequest>>,
    }

    #[async_trait]
    impl AdviceBackend for CapturingBackend {
        async fn suggest(&self, request: &AdviceRequest) -> Result<RawAdvice, AdviceError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(RawAdvice {
                suggestion: "ok".to_string(),
                stage: None,
                tip: None,
                caller_sentiment: None,
            })
        }
    }

    fn raw(stage: Option<&str>, sentiment: Option<&str>) -> RawAdvice {
        RawAdvice {
            suggestion: "Ask about their timeline.".to_string(),
            stage: stage.map(str::to_string),
            tip: Some("stay curious".to_string()),
            caller_sentiment: sentiment.map(str::to_string),
        }
    }

    fn context(stage: SalesStage) -> AdviceContext {
        AdviceContext {
            goal: "book a demo".to_string(),
            style_text: "warm".to_string(),
            current_stage: stage,
            recent_history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_success_applies_reported_stage() {
        let client = SuggestionClient::new(
            Arc::new(FixedBackend(Ok(raw(Some("discovery"), Some("hesitant"))))),
            6,
        );
        let outcome = client
            .get_suggestion("well maybe", &context(SalesStage::Greeting))
            .await;

        assert_eq!(outcome.suggestion.stage, SalesStage::Discovery);
        assert_eq!(outcome.suggestion.sentiment, Sentiment::Hesitant);
        assert!(outcome.advisory.is_none());
    }

    #[tokio::test]
    async fn test_unknown_stage_keeps_previous() {
        let client = SuggestionClient::new(
            Arc::new(FixedBackend(Ok(raw(Some("negotiation"), Some("joyful"))))),
            6,
        );
        let outcome = client
            .get_suggestion("hm", &context(SalesStage::Value))
            .await;

        assert_eq!(outcome.suggestion.stage, SalesStage::Value);
        assert_eq!(outcome.suggestion.sentiment, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back() {
        let client =
            SuggestionClient::new(Arc::new(FixedBackend(Err(AdviceError::RateLimited))), 6);
        let outcome = client
            .get_suggestion("anything", &context(SalesStage::Objection))
            .await;

        assert_eq!(
            outcome.suggestion,
            Suggestion::fallback(SalesStage::Objection)
        );
        assert!(outcome.advisory.is_some());
    }

    #[tokio::test]
    async fn test_history_bounded_to_window() {
        let backend = Arc::new(CapturingBackend {
            seen: std::sync::Mutex::new(None),
        });
        let client = SuggestionClient::new(backend.clone(), 3);

        let mut ctx = context(SalesStage::Discovery);
        ctx.recent_history = (0..8)
            .map(|i| HistoryTurn {
                role: "caller".to_string(),
                text: format!("turn {}", i),
            })
            .collect();

        client.get_suggestion("latest", &ctx).await;

        let seen = backend.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.conversation_history.len(), 3);
        assert_eq!(seen.conversation_history[0].text, "turn 5");
        assert_eq!(seen.conversation_history[2].text, "turn 7");
    }

    #[test]
    fn test_context_from_log() {
        let mut log = TranscriptLog::new();
        for i in 0..10 {
            log.push_caller(&format!("utterance {}", i));
        }
        let settings = CallSettings::default();
        let ctx = AdviceContext::from_log(&settings, SalesStage::Rapport, &log, 6);

        assert_eq!(ctx.recent_history.len(), 6);
        assert_eq!(ctx.recent_history[0].text, "utterance 4");
        assert_eq!(ctx.style_text, "warm");
        assert_eq!(ctx.current_stage, SalesStage::Rapport);
    }
}
