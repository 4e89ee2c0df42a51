use thiserror::Error;

/// Top-level error type for ambler-core.
#[derive(Debug, Error)]
pub enum AmblerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),
}

/// Configuration errors.
///
/// Every variant is terminal: raised once at construction or preset lookup,
/// never retried, and no partially-constructed object is left behind.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown lidar model: {0}")]
    UnknownLidarModel(String),

    #[error("Unknown environment: {0}")]
    UnknownEnv(String),

    #[error("Unknown RL preset: {0}")]
    UnknownRlPreset(String),

    #[error("Invalid timestep: {0} (must be > 0)")]
    InvalidTimestep(f64),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Shape-contract violations between engine state buffers.
///
/// Copy + static layout for cheap propagation in hot paths. A shape error
/// always indicates a programming defect: the caller handed a buffer whose
/// trailing dimension disagrees with the model, and nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("DOF position size mismatch: expected {expected}, got {got}")]
    DofPosMismatch { expected: usize, got: usize },

    #[error("DOF velocity size mismatch: expected {expected}, got {got}")]
    DofVelMismatch { expected: usize, got: usize },

    #[error("Control size mismatch: expected {expected}, got {got}")]
    CtrlMismatch { expected: usize, got: usize },

    #[error("Batch size mismatch: expected {expected}, got {got}")]
    BatchMismatch { expected: usize, got: usize },
}
