//! Harness configuration file format.
//!
//! Loads [`HarnessConfig`] from a TOML file (`hgemm.toml`) with environment
//! variable overrides via `HGEMM_*` prefixed variables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where device buffers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Device memory simulated in a separate host allocation.
    Host,
    /// NVIDIA GPU through the CUDA driver API.
    Cuda,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Cuda => write!(f, "cuda"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "cuda" => Ok(Self::Cuda),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Harness configuration loaded from TOML with environment variable overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Backend that owns device buffers.
    /// Override: `HGEMM_BACKEND`
    pub backend: BackendKind,

    /// Zero-based accelerator index.
    /// Override: `HGEMM_DEVICE_INDEX`
    pub device_index: usize,

    /// Lower bound of the initial uniform fill.
    /// Override: `HGEMM_RANDOM_MIN`
    pub min: f32,

    /// Upper bound (exclusive) of the initial uniform fill.
    /// Override: `HGEMM_RANDOM_MAX`
    pub max: f32,

    /// Seed for reproducible fills; entropy-seeded when absent.
    /// Override: `HGEMM_SEED`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Largest max-diff a comparison may report and still pass.
    /// Override: `HGEMM_TOLERANCE`
    pub tolerance: f64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        // the fill range affects how far hgemm results drift from the reference
        Self {
            backend: BackendKind::Host,
            device_index: 0,
            min: -2.0,
            max: 2.0,
            seed: None,
            tolerance: 0.05,
        }
    }
}

/// Largest finite `f16`. Fill bounds beyond it cannot be stored.
pub const F16_MAX: f32 = 65504.0;

const ENV_KEYS: [&str; 6] = [
    "HGEMM_BACKEND",
    "HGEMM_DEVICE_INDEX",
    "HGEMM_RANDOM_MIN",
    "HGEMM_RANDOM_MAX",
    "HGEMM_SEED",
    "HGEMM_TOLERANCE",
];

impl HarnessConfig {
    /// Names of every environment variable consulted by
    /// [`apply_env_overrides`](Self::apply_env_overrides).
    pub fn env_keys() -> &'static [&'static str] {
        &ENV_KEYS
    }

    /// Generate a default configuration TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).expect("default config should serialize")
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields, then apply environment variable overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: HarnessConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load only from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::Validation(format!(
                "random range must be finite, got [{}, {})",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(ConfigError::Validation(format!(
                "min must be <= max, got min={} max={}",
                self.min, self.max
            )));
        }
        if !(self.max - self.min).is_finite() {
            return Err(ConfigError::Validation(format!(
                "random range width overflows, got [{}, {})",
                self.min, self.max
            )));
        }
        if self.min.abs() > F16_MAX || self.max.abs() > F16_MAX {
            return Err(ConfigError::Validation(format!(
                "random range must lie within f16 range [-{F16_MAX}, {F16_MAX}], got [{}, {})",
                self.min, self.max
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Validation(format!(
                "tolerance must be a finite value >= 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Apply `HGEMM_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(val) = env_value("HGEMM_BACKEND") {
            self.backend = val.parse::<BackendKind>().map_err(|reason| {
                ConfigError::EnvOverride { key: "HGEMM_BACKEND".into(), value: val.clone(), reason }
            })?;
        }
        if let Some(val) = env_value("HGEMM_DEVICE_INDEX") {
            self.device_index = parse_env("HGEMM_DEVICE_INDEX", &val)?;
        }
        if let Some(val) = env_value("HGEMM_RANDOM_MIN") {
            self.min = parse_env("HGEMM_RANDOM_MIN", &val)?;
        }
        if let Some(val) = env_value("HGEMM_RANDOM_MAX") {
            self.max = parse_env("HGEMM_RANDOM_MAX", &val)?;
        }
        if let Some(val) = env_value("HGEMM_SEED") {
            self.seed = Some(parse_env("HGEMM_SEED", &val)?);
        }
        if let Some(val) = env_value("HGEMM_TOLERANCE") {
            self.tolerance = parse_env("HGEMM_TOLERANCE", &val)?;
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T>(key: &str, val: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    val.trim().parse::<T>().map_err(|e| ConfigError::EnvOverride {
        key: key.into(),
        value: val.into(),
        reason: e.to_string(),
    })
}
