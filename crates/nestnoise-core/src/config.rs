use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_stddev() -> f32 {
    0.1
}
fn default_name() -> String {
    "clipped_gaussian".into()
}

// ---------------------------------------------------------------------------
// ClippedGaussianConfig
// ---------------------------------------------------------------------------

/// Configuration for clipped Gaussian exploration noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippedGaussianConfig {
    /// Standard deviation of the added noise (default: 0.1). Must be finite.
    #[serde(default = "default_stddev")]
    pub stddev: f32,

    /// Seed for the noise key sequence (default: 0).
    #[serde(default)]
    pub seed: u64,

    /// Module name (default: `"clipped_gaussian"`). Has no numeric effect.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for ClippedGaussianConfig {
    fn default() -> Self {
        Self {
            stddev: default_stddev(),
            seed: 0,
            name: default_name(),
        }
    }
}

impl ClippedGaussianConfig {
    pub fn new(stddev: f32, seed: u64) -> Self {
        Self {
            stddev,
            seed,
            ..Self::default()
        }
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stddev.is_finite() {
            return Err(ConfigError::NonFiniteStdDev(self.stddev));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
