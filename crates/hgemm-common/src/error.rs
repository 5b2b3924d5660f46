//! Error types shared across the hgemm harness crates.

use thiserror::Error;

/// Errors raised by matrix fixtures when a precondition does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("matrix dimensions must be non-zero and fit in usize: rows={rows}, cols={cols}")]
    InvalidShape { rows: usize, cols: usize },

    #[error(
        "shape mismatch between '{name}' {expected:?} and base '{base}' {actual:?}"
    )]
    ShapeMismatch {
        name: String,
        base: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error(
        "invalid random range [{min}, {max}): bounds must be finite, within f16 range, with min <= max"
    )]
    InvalidRange { min: f32, max: f32 },

    #[error("element count mismatch: expected {expected}, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },
}

/// Direction of a host/device copy, used in transfer diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    HostToDevice,
    DeviceToHost,
}

impl std::fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostToDevice => write!(f, "host-to-device"),
            Self::DeviceToHost => write!(f, "device-to-host"),
        }
    }
}

/// Errors raised by the accelerator backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed to allocate {elems} f16 elements on device: {reason}")]
    Alloc { elems: usize, reason: String },

    #[error("{direction} copy failed: {reason}")]
    Transfer { direction: TransferDirection, reason: String },

    #[error("device memset failed: {reason}")]
    Memset { reason: String },

    #[error("buffer length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors that can occur when loading or validating a
/// [`HarnessConfig`](crate::config::HarnessConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride { key: String, value: String, reason: String },
}

/// Top-level error for the harness.
#[derive(Error, Debug)]
pub enum HgemmError {
    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, HgemmError>;
