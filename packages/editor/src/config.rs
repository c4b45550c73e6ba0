use crate::EditorError;
use pagesmith_model::{PageSettings, Viewport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor settings, read from camelCase JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo depth (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Property-panel keystrokes closer together than this share one undo step
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Title of a freshly reset page
    #[serde(default = "default_title")]
    pub default_title: String,

    #[serde(default)]
    pub default_viewport: Viewport,

    #[serde(default = "default_width")]
    pub default_width: String,
}

fn default_history_limit() -> usize {
    100
}

fn default_coalesce_window_ms() -> u64 {
    300
}

fn default_title() -> String {
    "Untitled page".to_string()
}

fn default_width() -> String {
    "1440".to_string()
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    /// Page settings of a freshly reset page
    pub fn default_settings(&self) -> PageSettings {
        PageSettings {
            viewport: self.default_viewport,
            width: self.default_width.clone(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            coalesce_window_ms: default_coalesce_window_ms(),
            default_title: default_title(),
            default_viewport: Viewport::default(),
            default_width: default_width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "historyLimit": 20,
            "coalesceWindowMs": 500,
            "defaultViewport": "mobile",
            "defaultWidth": "375"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.coalesce_window(), Duration::from_millis(500));
        assert_eq!(config.default_viewport, Viewport::Mobile);
        assert_eq!(config.default_title, "Untitled page");
        assert_eq!(config.default_settings().width, "375");
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.coalesce_window_ms, 300);
    }

    #[test]
    fn test_rejects_malformed_config() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "historyLimit": "lots" }"#),
            Err(EditorError::Config(_))
        ));
    }
}
