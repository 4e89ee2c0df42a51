//! Environment registry: name -> configuration preset.
//!
//! The Python ancestor of this layer registered environments through
//! decorators; here the table is an explicit match, which keeps lookup
//! failures in the ordinary error path.

use ambler_core::error::ConfigError;

use crate::config::{LidarConfig, WalkConfig};

/// A registered environment's configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvPreset {
    Walk(WalkConfig),
    LidarWalk(LidarConfig),
}

impl EnvPreset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Walk(_) => "go2-flat-terrain-walk",
            Self::LidarWalk(_) => "go2-flat-terrain-lidar-walk",
        }
    }
}

/// All registered environment names.
pub fn env_names() -> &'static [&'static str] {
    &["go2-flat-terrain-walk", "go2-flat-terrain-lidar-walk"]
}

/// Default configuration for a registered environment.
pub fn env_config(name: &str) -> Result<EnvPreset, ConfigError> {
    match name {
        "go2-flat-terrain-walk" => Ok(EnvPreset::Walk(WalkConfig::default())),
        "go2-flat-terrain-lidar-walk" => Ok(EnvPreset::LidarWalk(LidarConfig::default())),
        other => Err(ConfigError::UnknownEnv(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
