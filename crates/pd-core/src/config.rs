//! Editor configuration.
//!
//! Every field has a default, so a partial JSON object is a valid config.

use crate::layout::{PanelLayout, Viewport, cell_size};
use crate::model::{Color, MIN_EXTENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed editor config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid editor config: {0}")]
    Invalid(String),
}

/// Configuration for a document store and its controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Page size that layout presets divide. Default: **900×600**.
    pub canvas: Viewport,
    /// Inset from the canvas edge for layout presets. Default: **20**.
    pub margin: f32,
    /// Gap between preset panels. Default: **16**.
    pub gutter: f32,
    /// Maximum undo steps kept; the oldest is dropped beyond this. Default: **200**.
    pub history_depth: usize,
    /// Drag-to-create gestures smaller than this are discarded. Default: **5**.
    pub min_create_size: f32,
    pub panel_border_width: f32,
    pub panel_border_color: Color,
    pub panel_background: Color,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: Viewport::default(),
            margin: 20.0,
            gutter: 16.0,
            history_depth: 200,
            min_create_size: MIN_EXTENT,
            panel_border_width: 3.0,
            panel_border_color: Color::BLACK,
            panel_background: Color::WHITE,
        }
    }
}

impl EditorConfig {
    /// Parse and check a JSON config.
    ///
    /// # Errors
    /// Returns `ConfigError` on malformed JSON or values no layout can use.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::Invalid("historyDepth must be at least 1".into()));
        }
        if self.margin < 0.0 || self.gutter < 0.0 {
            return Err(ConfigError::Invalid("margin and gutter must be non-negative".into()));
        }
        for layout in PanelLayout::ALL {
            let (w, h) = cell_size(layout, self.canvas, self.margin, self.gutter);
            if w < MIN_EXTENT || h < MIN_EXTENT {
                return Err(ConfigError::Invalid(format!(
                    "canvas {}x{} leaves no room for {layout} panels",
                    self.canvas.width, self.canvas.height
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"historyDepth": 10}"#).unwrap();
        assert_eq!(config.history_depth, 10);
        assert_eq!(config.margin, 20.0);
        assert_eq!(config.canvas, Viewport::default());
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(matches!(
            EditorConfig::from_json(r#"{"historyDepth": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn canvas_too_small_for_three_columns_is_rejected() {
        // Two columns fit at 5.5 each; three would drop below 4.
        let json = r#"{"canvas": {"width": 51, "height": 600}, "margin": 20, "gutter": 0}"#;
        let Err(ConfigError::Invalid(msg)) = EditorConfig::from_json(json) else {
            panic!("expected Invalid");
        };
        assert!(msg.contains("grid-3x1"), "{msg}");
    }

    #[test]
    fn bad_json_is_rejected() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
