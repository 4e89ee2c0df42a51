//! PPO hyperparameter record.

use serde::{Deserialize, Serialize};

use ambler_core::error::ConfigError;

/// PPO training hyperparameters. A plain record: consumers hand it to
/// their training loop unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PpoConfig {
    pub seed: u64,
    /// Total environment steps across the whole run.
    pub max_env_steps: u64,
    pub num_envs: usize,
    /// Steps collected per environment between updates.
    pub rollouts: u32,
    pub learning_epochs: u32,
    pub mini_batches: u32,
    pub learning_rate: f64,
    pub policy_hidden_layer_sizes: Vec<usize>,
    pub value_hidden_layer_sizes: Vec<usize>,
    /// Share the feature trunk between policy and value heads.
    pub share_policy_value_features: bool,
    /// Checkpoint every n updates.
    pub check_point_interval: u32,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_env_steps: 10_000_000,
            num_envs: 1024,
            rollouts: 16,
            learning_epochs: 8,
            mini_batches: 4,
            learning_rate: 3e-4,
            policy_hidden_layer_sizes: vec![128, 128],
            value_hidden_layer_sizes: vec![128, 128],
            share_policy_value_features: true,
            check_point_interval: 200,
        }
    }
}

impl PpoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_envs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "num_envs".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.mini_batches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "mini_batches".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "learning_rate".into(),
                message: "must be > 0".into(),
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
    fn default_values_are_valid() {
        let cfg = PpoConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.num_envs, 1024);
        assert_eq!(cfg.rollouts, 16);
        assert!((cfg.learning_rate - 3e-4).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let cfg = PpoConfig {
            num_envs: 0,
            ..PpoConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PpoConfig {
            mini_batches: 0,
            ..PpoConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PpoConfig {
            learning_rate: 0.0,
            ..PpoConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_partial_override_keeps_defaults() {
        let cfg: PpoConfig = toml::from_str(
            r"
            num_envs = 2048
            learning_rate = 2e-4
        ",
        )
        .unwrap();
        assert_eq!(cfg.num_envs, 2048);
        assert!((cfg.learning_rate - 2e-4).abs() < f64::EPSILON);
        assert_eq!(cfg.rollouts, 16); // default preserved
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = PpoConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: PpoConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, cfg2);
    }
}
