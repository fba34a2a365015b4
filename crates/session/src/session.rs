//! Call session state machine
//!
//! Wires the capture engine, utterance gate, and suggestion client together
//! for one call at a time: starts/stops capture, owns the current stage and
//! settings, applies suggestion results, and appends to the transcript log.
//! Observers subscribe to a broadcast event stream instead of polling.
//!
//! Two guards keep interleaved async completions honest:
//! - every outbound suggestion request carries a monotonically increasing
//!   sequence number, and only the highest-numbered response ever applies, so
//!   a slow stale response cannot overwrite a newer suggestion;
//! - a generation counter is bumped on start/reset/end, and responses from an
//!   older generation are discarded outright.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc};

use call_coach_advice::{AdviceBackend, AdviceContext, SuggestionClient, SuggestionOutcome};
use call_coach_capture::{
    CaptureErrorKind, CaptureEvent, CaptureStatus, SpeechCaptureEngine, SpeechProvider,
};
use call_coach_config::Settings;
use call_coach_core::{CallSettings, SalesStage, Suggestion, TranscriptEntry, TranscriptLog};

use crate::gate::UtteranceGate;
use crate::SessionError;

/// Session state. Ended collapses back to Idle; a session can be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Active,
}

/// Events broadcast to session observers (transcript panel, suggestion card,
/// status line). Rendering is out of scope; this stream is the only coupling.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CallStarted,
    CallEnded { exchanges: usize },
    CallReset,
    /// Partial transcription of speech in progress
    Interim { text: String },
    /// A finalized caller utterance was appended to the transcript
    CallerUtterance(TranscriptEntry),
    /// The current suggestion was replaced
    SuggestionUpdated(Suggestion),
    StageChanged { from: SalesStage, to: SalesStage },
    /// The user marked the displayed suggestion as said
    SuggestionUsed(TranscriptEntry),
    /// Advisory capture lifecycle tag, UI feedback only
    Capture(CaptureStatus),
    /// Non-blocking notice; the suggestion panel never shows an error state
    Advisory { message: String },
}

struct SessionInner {
    engine: SpeechCaptureEngine,
    gate: UtteranceGate,
    client: SuggestionClient,
    settings: RwLock<CallSettings>,
    state: Mutex<CallState>,
    stage: Mutex<SalesStage>,
    suggestion: Mutex<Suggestion>,
    transcript: Mutex<TranscriptLog>,
    /// Bumped on start/reset/end; responses from an older phase are discarded
    generation: AtomicU64,
    /// Monotonic tag for outbound suggestion requests
    request_seq: AtomicU64,
    /// Highest sequence number whose response has been applied
    applied_seq: AtomicU64,
    event_tx: broadcast::Sender<SessionEvent>,
}

/// Top-level coaching session
pub struct CallSession {
    inner: Arc<SessionInner>,
    shutdown_tx: broadcast::Sender<()>,
}

impl CallSession {
    /// Wire a session from a speech provider, an advice backend, and
    /// application settings. Must be called within a tokio runtime: the
    /// event pumps are spawned here and live for the session object's
    /// lifetime.
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        backend: Arc<dyn AdviceBackend>,
        settings: &Settings,
    ) -> Self {
        let (engine, capture_rx) = SpeechCaptureEngine::new(provider, &settings.capture);
        let (gate, gate_rx) = UtteranceGate::new(&settings.gate);
        let client = SuggestionClient::new(backend, settings.advice.history_window);
        let (event_tx, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        let inner = Arc::new(SessionInner {
            engine,
            gate,
            client,
            settings: RwLock::new(settings.call.clone()),
            state: Mutex::new(CallState::Idle),
            stage: Mutex::new(SalesStage::Greeting),
            suggestion: Mutex::new(Suggestion::opening()),
            transcript: Mutex::new(TranscriptLog::new()),
            generation: AtomicU64::new(0),
            request_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
            event_tx,
        });

        spawn_capture_pump(Arc::clone(&inner), capture_rx, shutdown_tx.subscribe());
        spawn_dispatch_pump(Arc::clone(&inner), gate_rx, shutdown_tx.subscribe());

        Self { inner, shutdown_tx }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Start a call: Idle -> Active. Resets the transcript, stage, and
    /// suggestion, clears dedupe memory, then starts capture.
    ///
    /// Fails with [`SessionError::Unsupported`] when the platform has no
    /// speech provider and [`SessionError::PermissionDenied`] when microphone
    /// access is refused; both leave the session in Idle.
    pub async fn start(&self) -> Result<(), SessionError> {
        if !self.inner.engine.is_supported() {
            return Err(SessionError::Unsupported);
        }
        if *self.inner.state.lock() == CallState::Active {
            return Ok(());
        }

        self.inner.begin_phase();
        self.inner.engine.start().await?;

        *self.inner.state.lock() = CallState::Active;
        self.inner.emit(SessionEvent::CallStarted);
        tracing::info!("Call session started");
        Ok(())
    }

    /// End the call: Active -> Idle. Stops capture and cancels pending gate
    /// dispatch; the transcript stays intact for display until the next
    /// `start`. In-flight suggestion requests may complete but their results
    /// are discarded.
    pub fn end(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == CallState::Idle {
                return;
            }
            *state = CallState::Idle;
        }
        self.inner.engine.stop();
        self.inner.gate.cancel();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let exchanges = self.inner.transcript.lock().len();
        self.inner.emit(SessionEvent::CallEnded { exchanges });
        tracing::info!(exchanges, "Call session ended");
    }

    /// Clear the transcript and restore the stage and suggestion to their
    /// initial values without stopping capture.
    pub fn reset(&self) {
        self.inner.begin_phase();
        self.inner.emit(SessionEvent::CallReset);
    }

    /// Record that the user said the currently displayed suggestion: appends
    /// a suggestion-role transcript entry. Does not change the stage and does
    /// not fetch a new suggestion. No-op when the session is idle.
    pub fn mark_used(&self) -> Option<TranscriptEntry> {
        if *self.inner.state.lock() != CallState::Active {
            return None;
        }
        let text = self.inner.suggestion.lock().text.clone();
        let entry = self.inner.transcript.lock().push_suggestion(&text)?;
        self.inner.emit(SessionEvent::SuggestionUsed(entry.clone()));
        Some(entry)
    }

    pub fn state(&self) -> CallState {
        *self.inner.state.lock()
    }

    pub fn stage(&self) -> SalesStage {
        *self.inner.stage.lock()
    }

    pub fn suggestion(&self) -> Suggestion {
        self.inner.suggestion.lock().clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner.transcript.lock().entries().to_vec()
    }

    pub fn settings(&self) -> CallSettings {
        self.inner.settings.read().clone()
    }

    /// Replace the per-call settings; takes effect on the next suggestion
    /// request.
    pub fn update_settings(&self, settings: CallSettings) {
        *self.inner.settings.write() = settings;
    }

    pub fn is_listening(&self) -> bool {
        self.inner.engine.is_listening()
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        self.inner.engine.stop();
        let _ = self.shutdown_tx.send(());
    }
}

impl SessionInner {
    /// Reset to initial values and invalidate in-flight responses.
    fn begin_phase(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.gate.reset();
        self.transcript.lock().clear();
        *self.stage.lock() = SalesStage::Greeting;
        *self.suggestion.lock() = Suggestion::opening();
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn on_capture_event(self: &Arc<Self>, event: CaptureEvent) {
        match event {
            CaptureEvent::Interim(text) => self.emit(SessionEvent::Interim { text }),
            CaptureEvent::Final(text) => {
                if *self.state.lock() == CallState::Active {
                    self.gate.submit(&text);
                }
            },
            CaptureEvent::Status(status) => self.emit(SessionEvent::Capture(status)),
            CaptureEvent::Error(CaptureErrorKind::PermissionDenied) => {
                // Fatal to the session: capture cannot continue. The engine
                // has already cleared its listening intent.
                {
                    let mut state = self.state.lock();
                    if *state == CallState::Idle {
                        return;
                    }
                    *state = CallState::Idle;
                }
                self.gate.cancel();
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.emit(SessionEvent::Advisory {
                    message: "Microphone access denied. Allow microphone access to keep coaching."
                        .to_string(),
                });
                let exchanges = self.transcript.lock().len();
                self.emit(SessionEvent::CallEnded { exchanges });
            },
            CaptureEvent::Error(kind) => {
                self.emit(SessionEvent::Advisory {
                    message: format!("Capture issue ({}). Still listening.", kind.label()),
                });
            },
        }
    }

    /// Handle one gated utterance: append it to the transcript and fire a
    /// tagged suggestion request. The request runs in its own task so a new
    /// utterance is never blocked behind a slow round trip.
    fn dispatch(self: &Arc<Self>, text: String) {
        if *self.state.lock() != CallState::Active {
            return;
        }

        let Some(entry) = self.transcript.lock().push_caller(&text) else {
            return;
        };
        self.emit(SessionEvent::CallerUtterance(entry));

        let generation = self.generation.load(Ordering::SeqCst);
        let seq = self.request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let context = {
            let settings = self.settings.read();
            let stage = *self.stage.lock();
            let transcript = self.transcript.lock();
            AdviceContext::from_log(&settings, stage, &transcript, self.client.history_window())
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.client.get_suggestion(&text, &context).await;
            inner.apply(generation, seq, outcome);
        });
    }

    /// Apply one resolved suggestion request under the ordering guards.
    fn apply(&self, generation: u64, seq: u64, outcome: SuggestionOutcome) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(seq, "Discarding response from a previous session phase");
            return;
        }
        if *self.state.lock() != CallState::Active {
            tracing::debug!(seq, "Discarding response for an inactive session");
            return;
        }

        // Highest sequence number wins: a late response for a stale request
        // must not overwrite a newer one.
        let mut applied = self.applied_seq.load(Ordering::SeqCst);
        loop {
            if seq <= applied {
                tracing::debug!(seq, applied, "Discarding out-of-order response");
                return;
            }
            match self
                .applied_seq
                .compare_exchange(applied, seq, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(current) => applied = current,
            }
        }

        if let Some(message) = outcome.advisory {
            self.emit(SessionEvent::Advisory { message });
        }

        let suggestion = outcome.suggestion;
        let previous_stage = *self.stage.lock();
        *self.suggestion.lock() = suggestion.clone();
        self.emit(SessionEvent::SuggestionUpdated(suggestion.clone()));

        if suggestion.stage != previous_stage {
            *self.stage.lock() = suggestion.stage;
            self.emit(SessionEvent::StageChanged {
                from: previous_stage,
                to: suggestion.stage,
            });
        }
    }
}

fn spawn_capture_pump(
    inner: Arc<SessionInner>,
    mut capture_rx: mpsc::Receiver<CaptureEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = capture_rx.recv() => match event {
                    Some(event) => inner.on_capture_event(event),
                    None => break,
                },
            }
        }
    });
}

fn spawn_dispatch_pump(
    inner: Arc<SessionInner>,
    mut gate_rx: mpsc::Receiver<String>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                text = gate_rx.recv() => match text {
                    Some(text) => inner.dispatch(text),
                    None => break,
                },
            }
        }
    });
}
