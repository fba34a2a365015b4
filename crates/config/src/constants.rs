//! Centralized tuning constants
//!
//! Single source of truth for the timing and context defaults used across the
//! pipeline. Use these instead of hardcoding values in multiple crates.

/// Capture engine timing
pub mod capture {
    /// Delay before reopening the provider session after it self-terminates.
    /// Continuous dictation providers end sessions on their own; the short
    /// delay avoids a tight restart loop.
    pub const RESTART_DELAY_MS: u64 = 100;
}

/// Utterance gating
pub mod gate {
    /// Finalized text shorter than this is treated as noise and dropped.
    pub const MIN_UTTERANCE_CHARS: usize = 3;

    /// Quiet window after a final utterance before it is dispatched. A newer
    /// utterance inside the window supersedes the pending one.
    pub const QUIET_WINDOW_MS: u64 = 500;
}

/// Advice service
pub mod advice {
    /// Default advice service endpoint.
    pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8788/sales-assistant";

    /// Hard bound on the suggestion round trip; the request resolves to the
    /// local fallback rather than hanging past this.
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

    /// How many recent transcript entries accompany each request.
    pub const HISTORY_WINDOW: usize = 6;
}
