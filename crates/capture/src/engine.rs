//! Speech capture engine
//!
//! Owns the continuous-listening session against the speech provider and
//! normalizes its erratic lifecycle into a stable event stream. The central
//! algorithm is the restart-on-terminate reconciliation loop: the caller's
//! intent (`desired_listening`) is compared against observed provider
//! liveness, and whenever the provider ends a session on its own while the
//! intent is still to listen, exactly one reopen attempt is scheduled after a
//! short fixed delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use call_coach_config::CaptureConfig;

use crate::provider::{
    CaptureStatus, ProviderErrorKind, ProviderEvent, ProviderStream, SpeechProvider,
};
use crate::CaptureError;

/// Non-transient capture failures surfaced to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Microphone access refused; listening intent is cleared
    PermissionDenied,
    /// Network failure inside the provider; advisory
    Network,
    /// Audio device failure; advisory
    Audio,
    /// Anything else the provider reported
    Other(String),
}

impl CaptureErrorKind {
    /// Short tag for advisory messages.
    pub fn label(&self) -> &str {
        match self {
            CaptureErrorKind::PermissionDenied => "permission-denied",
            CaptureErrorKind::Network => "network",
            CaptureErrorKind::Audio => "audio-capture",
            CaptureErrorKind::Other(tag) => tag,
        }
    }
}

/// Event stream emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Partial transcription of speech in progress
    Interim(String),
    /// Completed utterance, trimmed; never empty
    Final(String),
    /// Advisory lifecycle tag, UI feedback only
    Status(CaptureStatus),
    /// Non-transient provider failure
    Error(CaptureErrorKind),
}

/// Continuous speech capture with self-healing restarts
pub struct SpeechCaptureEngine {
    provider: Arc<dyn SpeechProvider>,
    restart_delay: Duration,
    desired_listening: Arc<AtomicBool>,
    event_tx: mpsc::Sender<CaptureEvent>,
    shutdown_tx: broadcast::Sender<()>,
    run_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechCaptureEngine {
    /// Create an engine and the receiving half of its event stream.
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        config: &CaptureConfig,
    ) -> (Self, mpsc::Receiver<CaptureEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);

        let engine = Self {
            provider,
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            desired_listening: Arc::new(AtomicBool::new(false)),
            event_tx,
            shutdown_tx,
            run_handle: Mutex::new(None),
        };
        (engine, event_rx)
    }

    /// Whether the platform offers a speech provider at all.
    pub fn is_supported(&self) -> bool {
        self.provider.is_available()
    }

    /// Whether the caller currently intends to be listening.
    pub fn is_listening(&self) -> bool {
        self.desired_listening.load(Ordering::SeqCst)
    }

    /// Start continuous capture. Idempotent: a second start while the run
    /// loop is live is a no-op.
    ///
    /// Fails with [`CaptureError::Unsupported`] when the platform has no
    /// provider, and with [`CaptureError::PermissionDenied`] when microphone
    /// access is refused; the latter leaves `desired_listening` false.
    pub async fn start(&self) -> Result<(), CaptureError> {
        if !self.provider.is_available() {
            return Err(CaptureError::Unsupported);
        }

        {
            let handle = self.run_handle.lock();
            if handle.as_ref().is_some_and(|h| !h.is_finished()) {
                return Ok(());
            }
        }

        self.desired_listening.store(true, Ordering::SeqCst);

        let stream = match self.provider.open().await {
            Ok(stream) => stream,
            Err(e) => {
                self.desired_listening.store(false, Ordering::SeqCst);
                return Err(e);
            },
        };

        let provider = Arc::clone(&self.provider);
        let desired = Arc::clone(&self.desired_listening);
        let event_tx = self.event_tx.clone();
        let restart_delay = self.restart_delay;
        let shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(run_loop(
            provider,
            desired,
            event_tx,
            restart_delay,
            shutdown_rx,
            stream,
        ));
        *self.run_handle.lock() = Some(handle);

        Ok(())
    }

    /// Stop capture. Idempotent and always succeeds: clears the listening
    /// intent, cancels any pending restart, and releases the provider
    /// session.
    pub fn stop(&self) {
        self.desired_listening.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
        // The run loop exits via the shutdown signal; dropping the handle
        // does not abort it mid-forward.
        self.run_handle.lock().take();
    }
}

/// Forwarding outcome for one provider event
enum Forward {
    Continue,
    /// Permission was revoked; stop listening entirely
    Halt,
}

async fn run_loop(
    provider: Arc<dyn SpeechProvider>,
    desired: Arc<AtomicBool>,
    event_tx: mpsc::Sender<CaptureEvent>,
    restart_delay: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    mut stream: ProviderStream,
) {
    'session: loop {
        // Drain the current provider session.
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break 'session,
                event = stream.recv() => match event {
                    Some(event) => {
                        if let Forward::Halt = forward(event, &desired, &event_tx).await {
                            break 'session;
                        }
                    },
                    // Provider terminated the session on its own.
                    None => break,
                },
            }
        }

        if !desired.load(Ordering::SeqCst) {
            break;
        }

        // Schedule exactly one restart attempt after a fixed delay; a manual
        // stop during the delay cancels it.
        tracing::debug!("Provider session ended, restarting in {:?}", restart_delay);
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = sleep(restart_delay) => {},
        }
        if !desired.load(Ordering::SeqCst) {
            break;
        }

        match provider.open().await {
            Ok(new_stream) => stream = new_stream,
            Err(e) => {
                // A restart racing a manual stop may fail; swallow it rather
                // than surfacing an error for a session nobody wants anymore.
                tracing::debug!("Could not restart capture: {}", e);
                break;
            },
        }
    }
}

async fn forward(
    event: ProviderEvent,
    desired: &AtomicBool,
    event_tx: &mpsc::Sender<CaptureEvent>,
) -> Forward {
    match event {
        ProviderEvent::Interim(text) => {
            let _ = event_tx.send(CaptureEvent::Interim(text)).await;
        },
        ProviderEvent::Final(text) => {
            let text = text.trim();
            if !text.is_empty() {
                let _ = event_tx.send(CaptureEvent::Final(text.to_string())).await;
            }
        },
        ProviderEvent::Status(status) => {
            let _ = event_tx.send(CaptureEvent::Status(status)).await;
        },
        ProviderEvent::Error(kind) if kind.is_transient() => {
            tracing::debug!("Transient provider error: {:?}", kind);
        },
        ProviderEvent::Error(ProviderErrorKind::PermissionDenied) => {
            desired.store(false, Ordering::SeqCst);
            let _ = event_tx
                .send(CaptureEvent::Error(CaptureErrorKind::PermissionDenied))
                .await;
            return Forward::Halt;
        },
        ProviderEvent::Error(kind) => {
            let mapped = match kind {
                ProviderErrorKind::Network => CaptureErrorKind::Network,
                ProviderErrorKind::Audio => CaptureErrorKind::Audio,
                ProviderErrorKind::Other(tag) => CaptureErrorKind::Other(tag),
                // Transient and permission kinds handled above.
                _ => return Forward::Continue,
            };
            let _ = event_tx.send(CaptureEvent::Error(mapped)).await;
        },
    }
    Forward::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedProvider, ScriptedSession};

    fn test_config(restart_delay_ms: u64) -> CaptureConfig {
        CaptureConfig { restart_delay_ms }
    }

    #[tokio::test]
    async fn test_start_requires_provider() {
        let provider = Arc::new(ScriptedProvider::unavailable());
        let (engine, _rx) = SpeechCaptureEngine::new(provider, &test_config(10));

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, CaptureError::Unsupported));
        assert!(!engine.is_listening());
    }

    #[tokio::test]
    async fn test_permission_denied_clears_intent() {
        let provider = Arc::new(ScriptedProvider::denying_permission());
        let (engine, _rx) = SpeechCaptureEngine::new(provider, &test_config(10));

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied));
        assert!(!engine.is_listening());
    }

    #[tokio::test]
    async fn test_final_text_trimmed_and_empty_suppressed() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedSession::new()
            .final_text("   ")
            .final_text("  hello there  ")
            .stay_open()]));
        let (engine, mut rx) = SpeechCaptureEngine::new(provider, &test_config(10));
        engine.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, CaptureEvent::Final("hello there".to_string()));
        engine.stop();
    }

    #[tokio::test]
    async fn test_transient_errors_swallowed() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedSession::new()
            .error(ProviderErrorKind::NoSpeech)
            .error(ProviderErrorKind::Aborted)
            .final_text("still here")
            .stay_open()]));
        let (engine, mut rx) = SpeechCaptureEngine::new(provider, &test_config(10));
        engine.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        // The first observable event is the final text; the transient errors
        // never surfaced.
        assert_eq!(event, CaptureEvent::Final("still here".to_string()));
        engine.stop();
    }

    #[tokio::test]
    async fn test_mid_stream_permission_denial_halts() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedSession::new()
            .error(ProviderErrorKind::PermissionDenied)
            .stay_open()]));
        let (engine, mut rx) = SpeechCaptureEngine::new(provider.clone(), &test_config(10));
        engine.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            CaptureEvent::Error(CaptureErrorKind::PermissionDenied)
        );
        assert!(!engine.is_listening());

        // No restart follows a permission halt.
        sleep(Duration::from_millis(60)).await;
        assert_eq!(provider.open_count(), 1);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedSession::new().stay_open()
        ]));
        let (engine, _rx) = SpeechCaptureEngine::new(provider.clone(), &test_config(10));

        engine.start().await.unwrap();
        engine.start().await.unwrap();
        assert_eq!(provider.open_count(), 1);
        engine.stop();
    }
}
