//! Configuration file.
//!
//! ```yaml
//! serial:
//!   port: /dev/ttyACM0
//!   baud_rate: 9600
//! timing:
//!   wait_bound_ms: 8000
//! ```
//!
//! Every key is optional.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tpmania_serial_protocol::{SerialSettings, TransferTiming};
use tracing::{debug, info};

/// Config file read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tpmania.yaml";

/// Settings for the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialSettings,
    pub timing: TransferTiming,
}

impl AppConfig {
    /// Parse a config from YAML text. Empty text yields the defaults.
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        if text.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the config.
    ///
    /// An explicitly named file must exist. Without one, `tpmania.yaml` in
    /// the working directory is used if present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(AppConfig::default());
                }
                path
            }
        };

        let text = fs::read_to_string(&path)?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Apply `--port` and `--baud`.
    pub fn with_overrides(mut self, port: Option<String>, baud_rate: Option<u32>) -> Self {
        if port.is_some() {
            self.serial.port = port;
        }
        if let Some(baud_rate) = baud_rate {
            self.serial.baud_rate = baud_rate;
        }
        self
    }
}
