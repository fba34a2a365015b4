//! Per-call settings
//!
//! Owned by the settings UI (out of scope here) and consumed read-only by the
//! suggestion pipeline.

use serde::{Deserialize, Serialize};

/// Communication style for suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStyle {
    #[default]
    Warm,
    Professional,
    Concise,
    Consultative,
    /// Free-text style supplied in `CallSettings::custom_style`
    Custom,
}

impl ConversationStyle {
    pub fn keyword(&self) -> &'static str {
        match self {
            ConversationStyle::Warm => "warm",
            ConversationStyle::Professional => "professional",
            ConversationStyle::Concise => "concise",
            ConversationStyle::Consultative => "consultative",
            ConversationStyle::Custom => "custom",
        }
    }
}

/// Settings for one call, read-only input to suggestion requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSettings {
    /// What the user wants out of the call, free text
    pub goal: String,
    pub style: ConversationStyle,
    /// Only meaningful when `style` is `Custom`
    #[serde(default)]
    pub custom_style: String,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            goal: "Get them interested in learning more".to_string(),
            style: ConversationStyle::Warm,
            custom_style: String::new(),
        }
    }
}

impl CallSettings {
    /// The style text sent to the advice service: the custom text when the
    /// style is custom and non-empty, otherwise the style keyword.
    pub fn resolved_style_text(&self) -> &str {
        match self.style {
            ConversationStyle::Custom if !self.custom_style.trim().is_empty() => {
                &self.custom_style
            },
            ConversationStyle::Custom => ConversationStyle::default().keyword(),
            other => other.keyword(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_style_keyword() {
        let settings = CallSettings {
            style: ConversationStyle::Concise,
            ..Default::default()
        };
        assert_eq!(settings.resolved_style_text(), "concise");
    }

    #[test]
    fn test_resolved_style_custom() {
        let settings = CallSettings {
            style: ConversationStyle::Custom,
            custom_style: "playful but direct".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.resolved_style_text(), "playful but direct");
    }

    #[test]
    fn test_empty_custom_falls_back() {
        let settings = CallSettings {
            style: ConversationStyle::Custom,
            custom_style: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.resolved_style_text(), "warm");
    }
}
