//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use call_coach_core::CallSettings;

use crate::constants::{advice, capture, gate};
use crate::ConfigError;

/// Capture engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Delay before reopening a self-terminated provider session (ms)
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: default_restart_delay_ms(),
        }
    }
}

/// Utterance gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Noise floor: finalized text shorter than this is dropped
    #[serde(default = "default_min_utterance_chars")]
    pub min_utterance_chars: usize,

    /// Quiet window before a gated utterance is dispatched (ms)
    #[serde(default = "default_quiet_window_ms")]
    pub quiet_window_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_utterance_chars: default_min_utterance_chars(),
            quiet_window_ms: default_quiet_window_ms(),
        }
    }
}

/// Advice service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdviceConfig {
    /// Advice service endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional bearer token for the advice service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout (ms); the round trip resolves to the local fallback
    /// rather than exceeding this
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many recent transcript entries are sent as context
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            history_window: default_history_window(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Capture engine tuning
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Utterance gate tuning
    #[serde(default)]
    pub gate: GateConfig,

    /// Advice service connection
    #[serde(default)]
    pub advice: AdviceConfig,

    /// Default per-call settings; the settings UI overrides these at runtime
    #[serde(default)]
    pub call: CallSettings,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.advice.endpoint.is_empty() {
            return Err(ConfigError::MissingField("advice.endpoint".to_string()));
        }

        if self.advice.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "advice.timeout_ms".to_string(),
                message: "Timeout must be at least 1ms".to_string(),
            });
        }

        if self.advice.history_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "advice.history_window".to_string(),
                message: "History window must be at least 1".to_string(),
            });
        }

        if self.gate.min_utterance_chars == 0 {
            tracing::warn!("gate.min_utterance_chars is 0; every finalized utterance will pass");
        }

        Ok(())
    }
}

fn default_restart_delay_ms() -> u64 {
    capture::RESTART_DELAY_MS
}

fn default_min_utterance_chars() -> usize {
    gate::MIN_UTTERANCE_CHARS
}

fn default_quiet_window_ms() -> u64 {
    gate::QUIET_WINDOW_MS
}

fn default_endpoint() -> String {
    advice::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    advice::REQUEST_TIMEOUT_MS
}

fn default_history_window() -> usize {
    advice::HISTORY_WINDOW
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CALL_COACH_ prefix, `__` separator)
/// 2. config/{env}.toml (if env specified)
/// 3. config/default.toml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CALL_COACH")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
