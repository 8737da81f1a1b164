//! Mount-time configuration for a puzzle instance.
//!
//! A page may host several puzzles at once (today's puzzle, an archive entry,
//! a test board). Each one is mounted with its own [`PuzzleConfig`] and keeps
//! its interaction state apart from the others, keyed by `prefix`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;

/// Distance (CSS px) a touch must travel before it becomes a drag.
pub const TOUCH_DRAG_THRESHOLD_PX: f64 = 10.0;

/// Two activations of the same tile closer than this form a double activation.
pub const DOUBLE_ACTIVATION_WINDOW_MS: f64 = 300.0;

/// Which kind of page slot the puzzle occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InstanceKind {
    #[default]
    Daily,
    Archive,
    Test,
}

/// Input timing and distance knobs shared by the modality adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputTuning {
    pub touch_threshold_px: f64,
    pub double_activation_ms: f64,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            touch_threshold_px: TOUCH_DRAG_THRESHOLD_PX,
            double_activation_ms: DOUBLE_ACTIVATION_WINDOW_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PuzzleConfig {
    /// DOM id prefix and registry key for this instance.
    pub prefix: String,
    pub kind: InstanceKind,
    /// Tile letters in pool order; the tile index is the position here.
    pub letters: String,
    pub word_lengths: [usize; 2],
    pub hint_enabled: bool,
    pub input: InputTuning,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            prefix: "daily".to_string(),
            kind: InstanceKind::Daily,
            letters: String::new(),
            word_lengths: [0, 0],
            hint_enabled: true,
            input: InputTuning::default(),
        }
    }
}

impl PuzzleConfig {
    pub fn new(prefix: &str, letters: &str, word_lengths: [usize; 2]) -> Self {
        Self {
            prefix: prefix.to_string(),
            letters: letters.to_string(),
            word_lengths,
            ..Self::default()
        }
    }

    /// Decode a config handed over from JavaScript.
    #[cfg(feature = "serde_json")]
    pub fn from_json(text: &str) -> Result<Self, PuzzleError> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| PuzzleError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks that can be made without building the board.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        let prefix_ok = !self.prefix.is_empty()
            && self
                .prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(PuzzleError::InvalidPrefix(self.prefix.clone()));
        }
        if !(self.input.touch_threshold_px >= 0.0 && self.input.double_activation_ms >= 0.0) {
            return Err(PuzzleError::Config("input tuning must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_input_constants() {
        let cfg = PuzzleConfig::new("daily", "SNOWFLAKE", [4, 5]);
        assert_eq!(cfg.input.touch_threshold_px, 10.0);
        assert_eq!(cfg.input.double_activation_ms, 300.0);
        assert!(cfg.hint_enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn prefix_must_be_id_safe() {
        let cfg = PuzzleConfig::new("arch ive", "AB", [1, 1]);
        assert_eq!(cfg.validate(), Err(PuzzleError::InvalidPrefix("arch ive".into())));
        let cfg = PuzzleConfig::new("", "AB", [1, 1]);
        assert!(cfg.validate().is_err());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = PuzzleConfig::from_json(
            r#"{"prefix":"archive-12","kind":"archive","letters":"SNOWFLAKE","word_lengths":[4,5]}"#,
        )
        .unwrap();
        assert_eq!(cfg.kind, InstanceKind::Archive);
        assert_eq!(cfg.word_lengths, [4, 5]);
        assert_eq!(cfg.input, InputTuning::default());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn json_errors_become_config_errors() {
        let err = PuzzleConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
    }
}
