//! Utterance gate
//!
//! Debounces and deduplicates finalized speech before it may trigger a
//! suggestion request. Only the most recent distinct, sufficiently long
//! utterance within a burst reaches the dispatcher; identical consecutive
//! utterances are suppressed even across separate bursts.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use call_coach_config::GateConfig;

/// Debounce/dedupe gate in front of the suggestion dispatcher
pub struct UtteranceGate {
    min_chars: usize,
    quiet_window: Duration,
    tx: mpsc::Sender<String>,
    /// The most recently accepted text; adjacent duplicates are suppressed
    /// against this, by exact string equality only.
    last_accepted: Mutex<Option<String>>,
    /// The not-yet-fired dispatch, owned here so it can be cancelled.
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl UtteranceGate {
    /// Create a gate and the receiving half of its dispatch stream.
    pub fn new(config: &GateConfig) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(16);
        let gate = Self {
            min_chars: config.min_utterance_chars,
            quiet_window: Duration::from_millis(config.quiet_window_ms),
            tx,
            last_accepted: Mutex::new(None),
            pending: Mutex::new(None),
        };
        (gate, rx)
    }

    /// Submit one finalized utterance. Applies, in order: the noise floor,
    /// adjacent-duplicate suppression, then a quiet-window dispatch that
    /// supersedes any pending one.
    pub fn submit(&self, text: &str) {
        let text = text.trim();
        if text.chars().count() < self.min_chars {
            tracing::debug!("Utterance below noise floor, dropped: {:?}", text);
            return;
        }

        {
            let mut last = self.last_accepted.lock();
            if last.as_deref() == Some(text) {
                tracing::debug!("Adjacent duplicate utterance suppressed");
                return;
            }
            *last = Some(text.to_string());
        }

        let tx = self.tx.clone();
        let quiet_window = self.quiet_window;
        let text = text.to_string();
        let handle = tokio::spawn(async move {
            sleep(quiet_window).await;
            let _ = tx.send(text).await;
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending dispatch, if any. Dedupe memory is kept.
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }

    /// Cancel the pending dispatch and clear the dedupe memory, for a fresh
    /// session.
    pub fn reset(&self) {
        self.cancel();
        *self.last_accepted.lock() = None;
    }
}
