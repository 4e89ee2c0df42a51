//! Tuned PPO presets, one per registered environment.

use ambler_core::error::ConfigError;

use crate::ppo::PpoConfig;

/// All registered preset names.
pub fn rl_names() -> &'static [&'static str] {
    &[
        "cartpole",
        "walker",
        "go1-flat-terrain-walk",
        "go2-flat-terrain-walk",
        "go2-flat-terrain-lidar-walk",
    ]
}

/// Look up the preset for an environment. Unknown names are a terminal
/// configuration error.
pub fn rl_config(name: &str) -> Result<PpoConfig, ConfigError> {
    match name {
        "cartpole" => Ok(cartpole()),
        "walker" => Ok(walker()),
        "go1-flat-terrain-walk" => Ok(quadruped_walk()),
        // The lidar overlay trains with the same schedule as the plain
        // walk task; only the observation differs.
        "go2-flat-terrain-walk" | "go2-flat-terrain-lidar-walk" => Ok(quadruped_walk()),
        other => Err(ConfigError::UnknownRlPreset(other.to_string())),
    }
}

fn cartpole() -> PpoConfig {
    PpoConfig {
        max_env_steps: 10_000_000,
        check_point_interval: 500,
        policy_hidden_layer_sizes: vec![32, 32],
        value_hidden_layer_sizes: vec![32, 32],
        rollouts: 32,
        learning_epochs: 5,
        mini_batches: 4,
        ..PpoConfig::default()
    }
}

fn walker() -> PpoConfig {
    PpoConfig {
        seed: 42,
        max_env_steps: 1024 * 40_000,
        num_envs: 2048,
        learning_rate: 2e-4,
        rollouts: 24,
        learning_epochs: 4,
        mini_batches: 4,
        ..PpoConfig::default()
    }
}

fn quadruped_walk() -> PpoConfig {
    PpoConfig {
        seed: 42,
        share_policy_value_features: false,
        max_env_steps: 1024 * 60_000,
        num_envs: 2048,
        rollouts: 24,
        policy_hidden_layer_sizes: vec![256, 128, 64],
        value_hidden_layer_sizes: vec![256, 128, 64],
        learning_epochs: 5,
        mini_batches: 3,
        learning_rate: 3e-4,
        ..PpoConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
