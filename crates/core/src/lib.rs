//! Core domain types for the call coaching pipeline
//!
//! This crate provides the types shared by every other crate:
//! - Sales stage model and progression order
//! - Suggestion and sentiment types, including the fixed opening line and
//!   the local fallback
//! - Transcript entries and the append-only per-session log
//! - Per-call settings (goal and communication style)

pub mod settings;
pub mod stage;
pub mod suggestion;
pub mod transcript;

pub use settings::{CallSettings, ConversationStyle};
pub use stage::{SalesStage, STAGE_SEQUENCE};
pub use suggestion::{Sentiment, Suggestion};
pub use transcript::{EntryRole, TranscriptEntry, TranscriptLog};
