//! Engine configuration.
//!
//! Only tessellation quality is configurable; mould dimensions arrive with
//! each request. A config file may override any preset field:
//!
//! ```toml
//! [preview]
//! linear_deflection = 1.0
//!
//! [high]
//! max_segments = 1024
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tessellation::TessellationParams;

/// Named tessellation quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Interactive meshes.
    #[default]
    Preview,
    Standard,
    High,
}

/// Resolution accepted for file exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Standard,
    High,
}

impl From<Resolution> for Quality {
    fn from(value: Resolution) -> Self {
        match value {
            Resolution::Standard => Self::Standard,
            Resolution::High => Self::High,
        }
    }
}

/// Tessellation presets used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub preview: TessellationParams,
    pub standard: TessellationParams,
    pub high: TessellationParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preview: TessellationParams::preview(),
            standard: TessellationParams::standard(),
            high: TessellationParams::high(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document. Missing tables and fields keep their
    /// defaults: a missing table keeps the whole preset, a missing field
    /// takes the value of the `standard` preset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Preset` when a preset fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every preset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Preset` naming the first invalid preset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (preset, params) in [
            ("preview", &self.preview),
            ("standard", &self.standard),
            ("high", &self.high),
        ] {
            params
                .validate()
                .map_err(|source| ConfigError::Preset { preset, source })?;
        }
        Ok(())
    }

    /// Parameters for a quality level.
    #[must_use]
    pub fn params(&self, quality: Quality) -> &TessellationParams {
        match quality {
            Quality::Preview => &self.preview,
            Quality::Standard => &self.standard,
            Quality::High => &self.high,
        }
    }
}
