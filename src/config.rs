//! Editor session configuration.

use serde::{Deserialize, Serialize};

use crate::clipboard::DEFAULT_PASTE_OFFSET;
use crate::effects::DEFAULT_DURATION_MS;
use crate::error::{EditorError, EditorResult};
use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Tunables for one editor session. Every field has a default, so `{}` is a valid config.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots kept.
    pub history_capacity: usize,
    /// Offset applied to both axes on paste.
    pub paste_offset: f64,
    /// Total duration of an animation preview in milliseconds.
    pub animation_duration_ms: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub background: String,
    /// Family given to newly added text.
    pub default_font_family: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            paste_offset: DEFAULT_PASTE_OFFSET,
            animation_duration_ms: DEFAULT_DURATION_MS,
            canvas_width: 1920.0,
            canvas_height: 1080.0,
            background: "#ffffff".to_string(),
            default_font_family: "Roboto".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parses and validates a camelCase JSON config. An empty string yields the defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EditorConfig = serde_json::from_str(json).map_err(|e| EditorError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        if self.history_capacity == 0 {
            return Err(EditorError::config("historyCapacity must be at least 1"));
        }
        if !self.paste_offset.is_finite() {
            return Err(EditorError::config("pasteOffset must be finite"));
        }
        if !(self.animation_duration_ms.is_finite() && self.animation_duration_ms > 0.0) {
            return Err(EditorError::config("animationDurationMs must be positive"));
        }
        for (name, v) in [("canvasWidth", self.canvas_width), ("canvasHeight", self.canvas_height)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(EditorError::config(format!("{name} must be positive")));
            }
        }
        if self.background.trim().is_empty() {
            return Err(EditorError::config("background must not be empty"));
        }
        Ok(())
    }
}
