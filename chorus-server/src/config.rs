use std::{
    env,
    num::{ParseFloatError, ParseIntError},
    str::ParseBoolError,
};

use chorus_core::Config;
use thiserror::Error;

use crate::DEFAULT_PORT;

const PORT_VAR: &str = "CHORUS_SERVER_PORT";
const DRIFT_THRESHOLD_VAR: &str = "CHORUS_DRIFT_THRESHOLD";
const AUTOPLAY_VAR: &str = "CHORUS_AUTOPLAY";

/// Everything needed to start a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub sync: Config,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CHORUS_SERVER_PORT must be a port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("CHORUS_DRIFT_THRESHOLD must be a number of seconds: {0}")]
    InvalidDriftThreshold(#[from] ParseFloatError),
    #[error("CHORUS_DRIFT_THRESHOLD must be a positive number of seconds")]
    DriftThresholdOutOfRange,
    #[error("CHORUS_AUTOPLAY must be true or false: {0}")]
    InvalidAutoplay(#[from] ParseBoolError),
}

impl ServerConfig {
    /// Reads the config from the environment, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut sync = Config::default();

        let port = match lookup(PORT_VAR) {
            Some(port) => port.trim().parse()?,
            None => DEFAULT_PORT,
        };

        if let Some(threshold) = lookup(DRIFT_THRESHOLD_VAR) {
            let threshold: f32 = threshold.trim().parse()?;

            if !threshold.is_finite() || threshold <= 0. {
                return Err(ConfigError::DriftThresholdOutOfRange);
            }

            sync = sync.with_drift_threshold(threshold);
        }

        if let Some(autoplay) = lookup(AUTOPLAY_VAR) {
            sync.autoplay_on_enqueue = autoplay.trim().parse()?;
        }

        Ok(Self { port, sync })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            sync: Config::default(),
        }
    }
}
