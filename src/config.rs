//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "units_per_beat": 24, "seed": 7 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Step resolution: external ticks per beat (PPQ)
    pub units_per_beat: f64,
    /// Release batches kept per bus
    pub history_limit: usize,
    /// Cycle length for chains that do not set one
    pub default_cycle_beats: f64,
    /// Chromatic root for chains that do not set one
    pub default_root: i32,
    /// 0.0 to 1.0
    pub default_velocity: f64,
    /// Makes `?` reproducible when set
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            units_per_beat: 96.0,
            history_limit: 10,
            default_cycle_beats: 4.0,
            default_root: 60,
            default_velocity: 0.8,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Clamp out-of-range values, warning about each one
    pub fn normalized(mut self) -> Self {
        if !self.units_per_beat.is_finite() || self.units_per_beat < 1.0 {
            warn!(units_per_beat = self.units_per_beat, "units_per_beat raised to 1");
            self.units_per_beat = 1.0;
        }
        if !self.default_cycle_beats.is_finite() || self.default_cycle_beats <= 0.0 {
            warn!(cycle = self.default_cycle_beats, "default_cycle_beats reset to 4");
            self.default_cycle_beats = 4.0;
        }
        if !(0.0..=1.0).contains(&self.default_velocity) {
            warn!(velocity = self.default_velocity, "default_velocity clamped");
            self.default_velocity = if self.default_velocity.is_nan() {
                0.8
            } else {
                self.default_velocity.clamp(0.0, 1.0)
            };
        }
        let root = self.default_root.clamp(0, 127);
        if root != self.default_root {
            warn!(root = self.default_root, "default_root clamped");
            self.default_root = root;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "units_per_beat": 24, "seed": 7 }"#).unwrap();
        assert_eq!(config.units_per_beat, 24.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.default_root, 60);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ units_per_beat: }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_normalized_clamps() {
        let config = EngineConfig {
            units_per_beat: 0.0,
            default_cycle_beats: -1.0,
            default_velocity: 3.0,
            default_root: 200,
            ..EngineConfig::default()
        }
        .normalized();

        assert_eq!(config.units_per_beat, 1.0);
        assert_eq!(config.default_cycle_beats, 4.0);
        assert_eq!(config.default_velocity, 1.0);
        assert_eq!(config.default_root, 127);
    }
}
