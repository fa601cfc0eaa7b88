use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "pageforge.config.json";

/// Engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Reserved root container id; also the default selection anchor
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// Node type used for synthetic group containers
    #[serde(default = "default_group_type")]
    pub group_type: String,

    /// Horizontal drag distance that equals one nesting level
    #[serde(default = "default_indent_unit")]
    pub indent_unit: f64,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Prop edits closer together than this share one undo entry (0 = off)
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,
}

fn default_root_id() -> String {
    "root".to_string()
}

fn default_group_type() -> String {
    "Div".to_string()
}

fn default_indent_unit() -> f64 {
    24.0
}

fn default_max_levels() -> usize {
    100
}

fn default_coalesce_window_ms() -> u64 {
    500
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.root_id.is_empty() {
            return Err(EditorError::Config("rootId must not be empty".to_string()));
        }
        if self.group_type.is_empty() {
            return Err(EditorError::Config("groupType must not be empty".to_string()));
        }
        if !(self.indent_unit > 0.0) {
            return Err(EditorError::Config(format!(
                "indentUnit must be positive, got {}",
                self.indent_unit
            )));
        }
        Ok(())
    }

    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.history.coalesce_window_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            group_type: default_group_type(),
            indent_unit: default_indent_unit(),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
            coalesce_window_ms: default_coalesce_window_ms(),
        }
    }
}
