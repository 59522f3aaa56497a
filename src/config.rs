//! User configuration
//!
//! The only setting is the lifter's bodyweight, used as the denominator of the
//! strength ratio. Its mass unit is not checked against the logged weights: a
//! log in lb ranked against a bodyweight in kg inflates every rank.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Bodyweight used when none has been configured
pub const DEFAULT_BODYWEIGHT: f64 = 65.0;

/// Environment variable overriding the stored bodyweight
pub const BODYWEIGHT_ENV: &str = "LIFTFLUX_BODYWEIGHT";

/// Persisted user settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_bodyweight")]
    pub bodyweight: f64,
}

fn default_bodyweight() -> f64 {
    DEFAULT_BODYWEIGHT
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            bodyweight: DEFAULT_BODYWEIGHT,
        }
    }
}

impl UserConfig {
    /// Config with a validated bodyweight
    pub fn with_bodyweight(bodyweight: f64) -> Result<Self, ComputeError> {
        if !bodyweight.is_finite() || bodyweight <= 0.0 {
            return Err(ComputeError::InvalidBodyweight(bodyweight));
        }
        Ok(Self { bodyweight })
    }

    /// Load config from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        Self::with_bodyweight(config.bodyweight)
    }

    /// Serialize config to JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load config from a file; a missing file yields the default
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load config from a file, then apply the `LIFTFLUX_BODYWEIGHT` override
    pub fn load_with_env(path: &Path) -> Result<Self, ComputeError> {
        let config = Self::load(path)?;
        match std::env::var(BODYWEIGHT_ENV) {
            Ok(raw) => config.apply_override(&raw),
            Err(_) => Ok(config),
        }
    }

    fn apply_override(self, raw: &str) -> Result<Self, ComputeError> {
        match raw.trim().parse::<f64>() {
            Ok(value) => Self::with_bodyweight(value),
            Err(_) => {
                warn!(value = raw, "ignoring unparseable {}", BODYWEIGHT_ENV);
                Ok(self)
            }
        }
    }

    /// Write config to a file
    pub fn save(&self, path: &Path) -> Result<(), ComputeError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
