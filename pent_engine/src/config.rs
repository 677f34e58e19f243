use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine settings. Every field has a default so partial JSON files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen_width: i32,
    pub screen_height: i32,
    /// Native size of the scaled game view.
    pub scaled_width: i32,
    pub scaled_height: i32,
    /// Dim everything behind an open modal gump.
    pub faded_modal: bool,
    pub double_click_ms: u32,
    /// Pixels the pointer must travel with a button held before a drag starts.
    pub drag_threshold: i32,
    pub bark_ticks_per_char: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            screen_width: 640,
            screen_height: 400,
            scaled_width: 320,
            scaled_height: 200,
            faded_modal: true,
            double_click_ms: 200,
            drag_threshold: 2,
            bark_ticks_per_char: 4,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config, or returns defaults when no path is given.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing engine config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "faded_modal": false, "double_click_ms": 350 }"#)
                .expect("config parses");
        assert!(!config.faded_modal);
        assert_eq!(config.double_click_ms, 350);
        assert_eq!(config.screen_width, 640);
        assert_eq!(config.drag_threshold, 2);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = EngineConfig::from_json_file(None).expect("defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn config_file_round_trips_through_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.scaled_width = 160;
        fs::write(&path, serde_json::to_string(&config).expect("serialize")).expect("write");
        let loaded = EngineConfig::from_json_file(Some(&path)).expect("load");
        assert_eq!(loaded.scaled_width, 160);
    }
}
