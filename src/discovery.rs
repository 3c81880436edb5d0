use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ds18b20::RawSource;

/// Where the Linux 1-Wire subsystem exposes one directory per attached device.
pub const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";

/// Family code prefix of DS18B20 device directories (e.g. `28-0316a2795fff`).
pub const DS18B20_FAMILY_PREFIX: &str = "28-";

/// The file, inside a device directory, holding the sensor's last conversion.
pub const SLAVE_FILE: &str = "w1_slave";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The 1-Wire devices directory does not exist.
    #[error(
        "1-Wire interface not found at {path}; enable it with `dtoverlay=w1-gpio` in config.txt \
         or run `sudo modprobe w1-gpio && sudo modprobe w1-therm`"
    )]
    InterfaceNotEnabled { path: PathBuf },
    /// No device directory matched the family prefix.
    #[error("no sensor matching '{prefix}*' found under {path}; check the sensor wiring")]
    SensorNotFound { path: PathBuf, prefix: String },
    #[error("could not list {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// The discovered sensor's device directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceHandle {
    dir: PathBuf,
}

impl DeviceHandle {
    pub fn new(dir: impl Into<PathBuf>) -> DeviceHandle {
        DeviceHandle { dir: dir.into() }
    }

    /// The device directory, e.g. `/sys/bus/w1/devices/28-0316a2795fff`.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file the sensor's text representation is read from.
    pub fn data_file(&self) -> PathBuf {
        self.dir.join(SLAVE_FILE)
    }
}

impl RawSource for DeviceHandle {
    fn read_raw(&mut self) -> io::Result<String> {
        // Opened and closed on every read; no handle is held between polls.
        fs::read_to_string(self.data_file())
    }
}

/// Fails with [`Error::InterfaceNotEnabled`] unless `base_dir` is an existing directory.
pub fn check_interface(base_dir: impl AsRef<Path>) -> Result<(), Error> {
    let base_dir = base_dir.as_ref();
    if base_dir.is_dir() {
        Ok(())
    } else {
        Err(Error::InterfaceNotEnabled {
            path: base_dir.to_path_buf(),
        })
    }
}

/// Returns the first child of `base_dir` whose name starts with `family_prefix`.
///
/// Children are visited in the order the directory listing yields them, which is not sorted.
/// Only single-sensor deployments get a reproducible result.
pub fn discover(base_dir: impl AsRef<Path>, family_prefix: &str) -> Result<DeviceHandle, Error> {
    let base_dir = base_dir.as_ref();
    let entries = fs::read_dir(base_dir).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::InterfaceNotEnabled {
            path: base_dir.to_path_buf(),
        },
        _ => Error::Io {
            path: base_dir.to_path_buf(),
            source: err,
        },
    })?;

    for entry in entries {
        let entry = entry.map_err(|err| Error::Io {
            path: base_dir.to_path_buf(),
            source: err,
        })?;
        if entry.file_name().to_string_lossy().starts_with(family_prefix) {
            log::debug!("Found sensor directory {}", entry.path().display());
            return Ok(DeviceHandle::new(entry.path()));
        }
    }

    Err(Error::SensorNotFound {
        path: base_dir.to_path_buf(),
        prefix: family_prefix.to_owned(),
    })
}
