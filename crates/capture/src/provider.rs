//! Speech provider abstraction
//!
//! A provider is a continuous dictation service: it is opened, emits interim
//! and final transcription events, and may terminate its session at any time
//! for reasons unrelated to user intent. Termination is signalled by closing
//! the event stream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::CaptureError;

/// Advisory lifecycle tags from the provider. UI feedback only; these must
/// never gate correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Provider session opened and capturing
    CaptureOpened,
    /// Sound detected on the microphone
    SoundDetected,
    /// Provider detected the end of a speech segment
    SpeechEnded,
}

/// Error kinds as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// No speech detected in the window; transient
    NoSpeech,
    /// Session aborted by the provider; transient
    Aborted,
    /// Microphone access refused
    PermissionDenied,
    /// Network failure inside the provider
    Network,
    /// Audio device failure
    Audio,
    /// Anything else, with the provider's own tag
    Other(String),
}

impl ProviderErrorKind {
    /// Transient kinds are absorbed by the engine and never surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderErrorKind::NoSpeech | ProviderErrorKind::Aborted)
    }
}

/// One event from an open provider session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Best-effort partial transcription, superseded by the next event
    Interim(String),
    /// A completed utterance boundary
    Final(String),
    /// Advisory lifecycle tag
    Status(CaptureStatus),
    /// Provider-reported error; the session may keep running after it
    Error(ProviderErrorKind),
}

/// Event stream of one open provider session. The provider signals
/// self-termination by closing the stream.
pub type ProviderStream = mpsc::Receiver<ProviderEvent>;

/// A continuous dictation provider
///
/// `open` requests microphone access and starts a capture session; it fails
/// with [`CaptureError::PermissionDenied`] when access is refused. The
/// microphone handle is exclusively owned by the open session; at most one
/// session is open per engine at a time.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Whether the platform offers this provider at all.
    fn is_available(&self) -> bool;

    /// Open a capture session and return its event stream.
    async fn open(&self) -> Result<ProviderStream, CaptureError>;
}
