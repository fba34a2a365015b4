//! Transcript log
//!
//! Append-only ordered record of what the caller said and which suggestions
//! the user marked as used, scoped to one call session. Insertion order is
//! conversational order. Entries are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    /// The other party on the call
    Caller,
    /// A suggestion the user acknowledged saying
    Suggestion,
}

impl EntryRole {
    /// Wire label used in advice-service history.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRole::Caller => "caller",
            EntryRole::Suggestion => "suggestion",
        }
    }
}

/// One immutable transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Opaque unique token
    pub id: Uuid,
    pub role: EntryRole,
    /// Non-empty utterance or suggestion text
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(role: EntryRole, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered, append-only log of transcript entries for one session
#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a caller utterance. Empty text is rejected (returns `None`).
    pub fn push_caller(&mut self, text: &str) -> Option<TranscriptEntry> {
        self.push(EntryRole::Caller, text)
    }

    /// Append an acknowledged suggestion. Empty text is rejected.
    pub fn push_suggestion(&mut self, text: &str) -> Option<TranscriptEntry> {
        self.push(EntryRole::Suggestion, text)
    }

    fn push(&mut self, role: EntryRole, text: &str) -> Option<TranscriptEntry> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let entry = TranscriptEntry::new(role, text.to_string());
        self.entries.push(entry.clone());
        Some(entry)
    }

    /// The most recent `n` entries in conversational order, for bounded
    /// advice-service context.
    pub fn recent(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear the log for a new session or an explicit reset.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
