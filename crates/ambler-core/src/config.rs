use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_timestep() -> f64 {
    0.005
}
const fn default_num_envs() -> usize {
    1
}
const fn default_max_episode_steps() -> u32 {
    1000
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Shared simulation settings embedded by every task configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Physics timestep in seconds (default: 0.005 = 200 Hz).
    #[serde(default = "default_timestep")]
    pub timestep: f64,

    /// Number of parallel environment instances (default: 1).
    #[serde(default = "default_num_envs")]
    pub num_envs: usize,

    /// Maximum steps per episode (default: 1000).
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Master random seed.
    #[serde(default)]
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            num_envs: default_num_envs(),
            max_episode_steps: default_max_episode_steps(),
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        if self.num_envs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_envs".into(),
                message: "must be >= 1".into(),
            });
        }
        Ok(())
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_config_default_values() {
        let cfg = SimConfig::default();
        assert!((cfg.timestep - 0.005).abs() < f64::EPSILON);
        assert_eq!(cfg.num_envs, 1);
        assert_eq!(cfg.max_episode_steps, 1000);
        assert_eq!(cfg.seed, 0);
    }

    #[test]
    fn sim_config_validate_ok() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn sim_config_validate_invalid_timestep() {
        let cfg = SimConfig {
            timestep: 0.0,
            ..SimConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimestep(_)));
    }

    #[test]
    fn sim_config_validate_zero_envs() {
        let cfg = SimConfig {
            num_envs: 0,
            ..SimConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn sim_config_toml_deserialization() {
        let toml_str = r"
            timestep = 0.002
            num_envs = 2048
            max_episode_steps = 500
            seed = 42
        ";
        let cfg: SimConfig = toml::from_str(toml_str).unwrap();
        assert!((cfg.timestep - 0.002).abs() < f64::EPSILON);
        assert_eq!(cfg.num_envs, 2048);
        assert_eq!(cfg.max_episode_steps, 500);
        assert_eq!(cfg.seed, 42);
    }

    #[test]
    fn sim_config_toml_defaults() {
        let cfg: SimConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, SimConfig::default());
    }

    #[test]
    fn sim_config_from_file_not_found() {
        assert!(SimConfig::from_file("/nonexistent/path/config.toml").is_err());
    }
}
