//! Scripted speech provider
//!
//! A deterministic [`SpeechProvider`] that replays pre-written sessions, used
//! by the test suites and by demos that have no microphone. Each call to
//! `open` consumes the next scripted session; once the script is exhausted,
//! further sessions stay open and silent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::provider::{
    CaptureStatus, ProviderErrorKind, ProviderEvent, ProviderStream, SpeechProvider,
};
use crate::CaptureError;

enum Step {
    Emit(ProviderEvent),
    Pause(Duration),
}

/// One scripted capture session
///
/// By default the session self-terminates (the stream closes) after its last
/// step, mimicking a continuous dictation provider ending a session on its
/// own. Call [`stay_open`](Self::stay_open) to keep it live instead.
#[derive(Default)]
pub struct ScriptedSession {
    steps: Vec<Step>,
    stay_open: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interim(mut self, text: &str) -> Self {
        self.steps.push(Step::Emit(ProviderEvent::Interim(text.to_string())));
        self
    }

    pub fn final_text(mut self, text: &str) -> Self {
        self.steps.push(Step::Emit(ProviderEvent::Final(text.to_string())));
        self
    }

    pub fn status(mut self, status: CaptureStatus) -> Self {
        self.steps.push(Step::Emit(ProviderEvent::Status(status)));
        self
    }

    pub fn error(mut self, kind: ProviderErrorKind) -> Self {
        self.steps.push(Step::Emit(ProviderEvent::Error(kind)));
        self
    }

    /// Insert a pause between events, for pacing-sensitive tests.
    pub fn pause_ms(mut self, millis: u64) -> Self {
        self.steps.push(Step::Pause(Duration::from_millis(millis)));
        self
    }

    /// Keep the session open after the last step instead of closing it.
    pub fn stay_open(mut self) -> Self {
        self.stay_open = true;
        self
    }
}

/// Deterministic provider replaying scripted sessions
pub struct ScriptedProvider {
    sessions: Mutex<VecDeque<ScriptedSession>>,
    opens: AtomicUsize,
    available: bool,
    deny_permission: bool,
}

impl ScriptedProvider {
    pub fn new(sessions: Vec<ScriptedSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            opens: AtomicUsize::new(0),
            available: true,
            deny_permission: false,
        }
    }

    /// A provider the platform does not offer.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    /// A provider whose microphone access is refused.
    pub fn denying_permission() -> Self {
        Self {
            deny_permission: true,
            ..Self::new(Vec::new())
        }
    }

    /// How many sessions have been opened so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for ScriptedProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn open(&self) -> Result<ProviderStream, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::PermissionDenied);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);

        let session = self.sessions.lock().pop_front();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let Some(session) = session else {
                // Script exhausted: stay open and silent until the engine
                // drops the stream.
                tx.closed().await;
                return;
            };

            for step in session.steps {
                match step {
                    Step::Emit(event) => {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    },
                    Step::Pause(duration) => sleep(duration).await,
                }
            }

            if session.stay_open {
                tx.closed().await;
            }
            // Otherwise the sender drops here and the stream closes,
            // simulating provider-initiated termination.
        });

        Ok(rx)
    }
}
