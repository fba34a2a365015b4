//! Call session orchestration
//!
//! Features:
//! - Idle/Active state machine with restartable sessions
//! - Utterance gating (noise floor, adjacent dedupe, quiet-window debounce)
//! - Sequence-numbered suggestion dispatch with stale-response discard
//! - Broadcast event stream for UI observers

pub mod gate;
pub mod session;

pub use gate::UtteranceGate;
pub use session::{CallSession, CallState, SessionEvent};

use thiserror::Error;

use call_coach_capture::CaptureError;

/// Session errors. Only `Unsupported` and `PermissionDenied` halt the
/// coaching flow; everything else degrades to advisories and fallbacks.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No speech provider available on this platform")]
    Unsupported,

    #[error("Microphone access refused")]
    PermissionDenied,

    #[error("Capture failure: {0}")]
    Capture(String),
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unsupported => SessionError::Unsupported,
            CaptureError::PermissionDenied => SessionError::PermissionDenied,
            CaptureError::Provider(message) => SessionError::Capture(message),
        }
    }
}
