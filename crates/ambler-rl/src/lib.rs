//! RL hyperparameter presets.
//!
//! Plain data records: no training algorithm lives here. Each registered
//! environment gets a PPO configuration tuned for it.

pub mod ppo;
pub mod presets;

pub use ppo::PpoConfig;
pub use presets::{rl_config, rl_names};
