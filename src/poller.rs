use core::fmt;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use std::path::PathBuf;

use crate::config::Config;
use crate::discovery::{self, DeviceHandle};
use crate::ds18b20::{self, Reading};
use crate::gpio::{self, PinSet, SysfsPin};
use crate::threshold::{OutputState, ThresholdController};

/// How the sensor is found on each poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceLocator {
    /// Discovered once, at startup.
    Fixed(DeviceHandle),
    /// Discovered again on every poll.
    Rescan { base_dir: PathBuf, prefix: String },
}

impl DeviceLocator {
    pub fn locate(&self) -> Result<DeviceHandle, discovery::Error> {
        match self {
            DeviceLocator::Fixed(handle) => Ok(handle.clone()),
            DeviceLocator::Rescan { base_dir, prefix } => discovery::discover(base_dir, prefix),
        }
    }
}

impl fmt::Display for DeviceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceLocator::Fixed(handle) => write!(f, "{}", handle.dir().display()),
            DeviceLocator::Rescan { base_dir, prefix } => {
                write!(f, "{}/{}* (rescanned every poll)", base_dir.display(), prefix)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Discovery(#[from] discovery::Error),
    #[error(transparent)]
    Read(#[from] ds18b20::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("the control section must list at least one pin")]
    NoControlPins,
    #[error(transparent)]
    Gpio(#[from] gpio::Error),
    #[error(transparent)]
    Discovery(#[from] discovery::Error),
}

/// The outcome of one poll.
#[derive(Debug)]
pub struct Cycle {
    pub reading: Result<Reading, CycleError>,
    /// The output state after the poll, if pins are being controlled.
    pub output: Option<OutputState>,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reading {
            Ok(reading) => write!(f, "Temperature: {}", reading)?,
            Err(err) => write!(f, "Error reading temperature: {}", err)?,
        }
        if let Some(output) = &self.output {
            write!(f, " | Output: {}", output)?;
        }
        Ok(())
    }
}

struct Control<TPin>
where
    TPin: OutputPin,
{
    controller: ThresholdController,
    pins: PinSet<TPin>,
    state: OutputState,
}

/// Reads the sensor and, if configured, drives the output pins from the reading.
///
/// The pins are owned by the poller and released when it is dropped.
pub struct Poller<TPin>
where
    TPin: OutputPin,
{
    locator: DeviceLocator,
    control: Option<Control<TPin>>,
}

impl<TPin> Poller<TPin>
where
    TPin: OutputPin,
{
    pub fn new(locator: DeviceLocator, control: Option<(ThresholdController, PinSet<TPin>)>) -> Self {
        Poller {
            locator,
            control: control.map(|(controller, pins)| Control {
                controller,
                state: pins.initial_state(),
                pins,
            }),
        }
    }

    pub fn locator(&self) -> &DeviceLocator {
        &self.locator
    }

    pub fn controller(&self) -> Option<&ThresholdController> {
        self.control.as_ref().map(|control| &control.controller)
    }

    pub fn output_state(&self) -> Option<&OutputState> {
        self.control.as_ref().map(|control| &control.state)
    }

    /// Runs one poll. Errors are logged and reported in the returned [`Cycle`], never propagated.
    pub fn poll_once<TDelay>(&mut self, delay: &mut TDelay) -> Cycle
    where
        TDelay: DelayNs,
    {
        let reading = self
            .locator
            .locate()
            .map_err(CycleError::from)
            .and_then(|mut device| {
                ds18b20::read_temperature(&mut device, delay).map_err(CycleError::from)
            });
        if let Err(err) = &reading {
            log::warn!("No reading this cycle: {}", err);
        }

        let output = self.control.as_mut().map(|control| {
            match control.controller.update(
                reading.as_ref().ok(),
                &mut control.pins,
                control.state.clone(),
            ) {
                Ok(state) => control.state = state,
                Err(err) => {
                    log::error!("{}", err);
                    control.state = err.state;
                }
            }
            control.state.clone()
        });

        Cycle { reading, output }
    }
}

impl Poller<SysfsPin> {
    /// Claims the configured pins, then locates the sensor.
    ///
    /// In rescan mode the sensor itself is looked up on each poll, but the 1-Wire interface must
    /// already be present.
    ///
    /// Pins claimed before a later step fails are released before this returns.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let control = match &config.control {
            Some(control) => {
                if control.pins.is_empty() {
                    return Err(StartupError::NoControlPins);
                }
                let mut pins = Vec::with_capacity(control.pins.len());
                for number in control.pins.iter() {
                    pins.push((*number, SysfsPin::export(&config.gpio_root, *number)?));
                }
                Some((control.controller(), PinSet::acquire(pins)?))
            }
            None => None,
        };

        let locator = if config.rescan_every_poll {
            // Only a missing sensor is retried per poll; a missing interface is still fatal.
            discovery::check_interface(&config.devices_dir)?;
            DeviceLocator::Rescan {
                base_dir: config.devices_dir.clone(),
                prefix: config.family_prefix.clone(),
            }
        } else {
            DeviceLocator::Fixed(discovery::discover(
                &config.devices_dir,
                &config.family_prefix,
            )?)
        };

        Ok(Poller::new(locator, control))
    }
}
