use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::discovery::{DS18B20_FAMILY_PREFIX, W1_DEVICES_DIR};
use crate::gpio::SYSFS_GPIO_ROOT;
use crate::threshold::{Comparison, ThresholdController};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Pins to drive from the temperature, and when.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Control {
    /// BCM GPIO numbers.
    pub pins: Vec<u32>,
    pub threshold_fahrenheit: f64,
    #[serde(default)]
    pub comparison: Comparison,
}

impl Control {
    pub fn controller(&self) -> ThresholdController {
        ThresholdController::new(self.threshold_fahrenheit, self.comparison)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub devices_dir: PathBuf,
    pub family_prefix: String,
    pub poll_interval_ms: u64,
    /// Look the sensor up again on every poll instead of once at startup.
    pub rescan_every_poll: bool,
    pub gpio_root: PathBuf,
    pub control: Option<Control>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            devices_dir: PathBuf::from(W1_DEVICES_DIR),
            family_prefix: DS18B20_FAMILY_PREFIX.to_owned(),
            poll_interval_ms: 1000,
            rescan_every_poll: false,
            gpio_root: PathBuf::from(SYSFS_GPIO_ROOT),
            control: None,
        }
    }
}

impl Config {
    pub fn parse(config_str: String) -> Result<Config, Error> {
        Ok(serde_yaml::from_str(&config_str)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        Config::parse(config_str)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
