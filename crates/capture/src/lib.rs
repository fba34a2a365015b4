//! Continuous speech capture with self-healing restarts
//!
//! Features:
//! - Provider abstraction over platform dictation services
//! - Restart-on-terminate reconciliation driven by listening intent
//! - Transient error absorption (no-speech, aborted)
//! - Scripted provider for tests and microphone-free demos

pub mod engine;
pub mod provider;
pub mod scripted;

pub use engine::{CaptureErrorKind, CaptureEvent, SpeechCaptureEngine};
pub use provider::{
    CaptureStatus, ProviderErrorKind, ProviderEvent, ProviderStream, SpeechProvider,
};
pub use scripted::{ScriptedProvider, ScriptedSession};

use thiserror::Error;

/// Capture errors
///
/// Only `Unsupported` and `PermissionDenied` can halt a session start; every
/// other failure is absorbed or surfaced as an advisory event.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No speech provider available on this platform")]
    Unsupported,

    #[error("Microphone access refused")]
    PermissionDenied,

    #[error("Provider error: {0}")]
    Provider(String),
}
