//! Environment-level error umbrella.

use thiserror::Error;

use ambler_bridge::BridgeError;
use ambler_core::error::{ConfigError, ShapeError};
use ambler_lidar::TracerError;
use ambler_sim::SceneError;

/// Any failure constructing or running an environment. Every variant is
/// terminal; nothing here is retried.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Tracer error: {0}")]
    Tracer(#[from] TracerError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_config_error() {
        let err: EnvError = ConfigError::UnknownLidarModel("x".into()).into();
        assert!(matches!(err, EnvError::Config(_)));
        assert!(err.to_string().contains("Unknown lidar model"));
    }

    #[test]
    fn wraps_shape_error() {
        let err: EnvError = ShapeError::DofPosMismatch {
            expected: 19,
            got: 3,
        }
        .into();
        assert!(matches!(err, EnvError::Shape(_)));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<EnvError>();
    }
}
