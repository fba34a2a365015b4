//! Sales stage model
//!
//! The coach tracks where in the sales flow the call currently is. The stage
//! sequence is fixed and ordered; the advice service may report any stage, so
//! the rest of the system treats the index in this sequence as progress and
//! coerces unknown ids to the previous stage instead of rejecting them.

use serde::{Deserialize, Serialize};

/// Sales conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SalesStage {
    /// Brief, warm opener; get permission to talk
    #[default]
    Greeting,
    /// Quick personal connection
    Rapport,
    /// Current situation and pain points
    Discovery,
    /// Present how you solve their specific problems
    Value,
    /// Handle concerns with empathy and facts
    Objection,
    /// Propose a concrete next action
    NextStep,
    /// Confirm the commitment, set expectations
    Close,
}

/// All stages in conversational order.
pub const STAGE_SEQUENCE: [SalesStage; 7] = [
    SalesStage::Greeting,
    SalesStage::Rapport,
    SalesStage::Discovery,
    SalesStage::Value,
    SalesStage::Objection,
    SalesStage::NextStep,
    SalesStage::Close,
];

impl SalesStage {
    /// Position in the fixed stage sequence, used by the UI as progress.
    pub fn index(&self) -> usize {
        STAGE_SEQUENCE
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    /// Wire id as sent to and received from the advice service.
    pub fn id(&self) -> &'static str {
        match self {
            SalesStage::Greeting => "greeting",
            SalesStage::Rapport => "rapport",
            SalesStage::Discovery => "discovery",
            SalesStage::Value => "value",
            SalesStage::Objection => "objection",
            SalesStage::NextStep => "next_step",
            SalesStage::Close => "close",
        }
    }

    /// Parse a wire id. Unknown ids yield `None`; callers keep the previous
    /// stage rather than erroring.
    pub fn from_id(id: &str) -> Option<Self> {
        STAGE_SEQUENCE.iter().copied().find(|s| s.id() == id)
    }

    /// Display name for UI labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            SalesStage::Greeting => "Greeting",
            SalesStage::Rapport => "Rapport",
            SalesStage::Discovery => "Discovery",
            SalesStage::Value => "Value",
            SalesStage::Objection => "Objection",
            SalesStage::NextStep => "Next Step",
            SalesStage::Close => "Close",
        }
    }
}
