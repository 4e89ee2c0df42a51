//! Environment configuration records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ambler_core::config::SimConfig;
use ambler_core::error::ConfigError;
use ambler_lidar::TracerBackend;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_keyframe() -> String {
    "home".into()
}
fn default_lidar_model() -> String {
    "mid360".into()
}
const fn default_downsample() -> usize {
    1
}
const fn default_max_range() -> f64 {
    100.0
}
fn default_mount_site() -> String {
    "lidar".into()
}
fn default_exclude_body() -> String {
    "base".into()
}
const fn default_geom_group() -> usize {
    2
}

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Base locomotion task configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Scene description file.
    pub model_file: PathBuf,

    #[serde(default)]
    pub sim: SimConfig,

    /// Keyframe the task resets to.
    #[serde(default = "default_keyframe")]
    pub keyframe: String,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            model_file: PathBuf::from("demos/go2_flat.xml"),
            sim: SimConfig::default(),
            keyframe: default_keyframe(),
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()
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
// LidarConfig
// ---------------------------------------------------------------------------

/// Lidar-walk task configuration: the base walk task plus the sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarConfig {
    #[serde(flatten)]
    pub walk: WalkConfig,

    /// Sensor model identifier (e.g. "mid360", "hdl64", "custom").
    #[serde(default = "default_lidar_model")]
    pub lidar_model: String,

    /// Keep every n-th ray of the pattern (>= 1).
    #[serde(default = "default_downsample")]
    pub downsample: usize,

    /// Regenerate the ray pattern on every scan (Livox models only).
    #[serde(default)]
    pub dynamic: bool,

    /// Tracer implementation, fixed at construction.
    #[serde(default)]
    pub backend: TracerBackend,

    /// Miss distance reported by the tracer.
    #[serde(default = "default_max_range")]
    pub max_range: f64,

    /// Named site the sensor is mounted on.
    #[serde(default = "default_mount_site")]
    pub mount_site: String,

    /// Body whose geoms are invisible to the sensor (the robot's own base).
    #[serde(default = "default_exclude_body")]
    pub exclude_body: String,

    /// Collision group visible to the sensor (terrain geoms).
    #[serde(default = "default_geom_group")]
    pub geom_group: usize,
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self {
            walk: WalkConfig::default(),
            lidar_model: default_lidar_model(),
            downsample: default_downsample(),
            dynamic: false,
            backend: TracerBackend::default(),
            max_range: default_max_range(),
            mount_site: default_mount_site(),
            exclude_body: default_exclude_body(),
            geom_group: default_geom_group(),
        }
    }
}

impl LidarConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.walk.validate()?;
        if self.downsample == 0 {
            return Err(ConfigError::InvalidValue {
                field: "downsample".into(),
                message: "must be >= 1".into(),
            });
        }
        if self.geom_group > 5 {
            return Err(ConfigError::InvalidValue {
                field: "geom_group".into(),
                message: "collision groups are 0-5".into(),
            });
        }
        if self.max_range <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_range".into(),
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
    fn walk_config_defaults() {
        let cfg = WalkConfig::default();
        assert_eq!(cfg.keyframe, "home");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn lidar_config_defaults() {
        let cfg = LidarConfig::default();
        assert_eq!(cfg.lidar_model, "mid360");
        assert_eq!(cfg.downsample, 1);
        assert!(!cfg.dynamic);
        assert_eq!(cfg.backend, TracerBackend::Batched);
        assert_eq!(cfg.mount_site, "lidar");
        assert_eq!(cfg.exclude_body, "base");
        assert_eq!(cfg.geom_group, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn lidar_config_rejects_zero_downsample() {
        let cfg = LidarConfig {
            downsample: 0,
            ..LidarConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn lidar_config_rejects_bad_group_and_range() {
        let cfg = LidarConfig {
            geom_group: 6,
            ..LidarConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LidarConfig {
            max_range: 0.0,
            ..LidarConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn lidar_config_toml_roundtrip() {
        let toml_str = r#"
            model_file = "scenes/go2.xml"
            lidar_model = "hdl64"
            downsample = 4
            dynamic = true
            backend = "cached"
            max_range = 40.0

            [sim]
            num_envs = 128
        "#;
        let cfg: LidarConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.walk.model_file, PathBuf::from("scenes/go2.xml"));
        assert_eq!(cfg.lidar_model, "hdl64");
        assert_eq!(cfg.downsample, 4);
        assert!(cfg.dynamic);
        assert_eq!(cfg.backend, TracerBackend::Cached);
        assert!((cfg.max_range - 40.0).abs() < f64::EPSILON);
        assert_eq!(cfg.walk.sim.num_envs, 128);
    }

    #[test]
    fn walk_config_toml_defaults_applied() {
        let cfg: WalkConfig = toml::from_str(r#"model_file = "a.xml""#).unwrap();
        assert_eq!(cfg.keyframe, "home");
        assert_eq!(cfg.sim, SimConfig::default());
    }
}
