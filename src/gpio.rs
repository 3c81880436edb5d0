use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, PinState, StatefulOutputPin};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::threshold::OutputState;

/// Where the Linux sysfs GPIO interface lives.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sysfs GPIO file could not be read or written.
    #[error("could not {action} GPIO {pin}: {source}")]
    PinAccess {
        pin: u32,
        action: &'static str,
        source: io::Error,
    },
}

impl digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An output pin claimed through `/sys/class/gpio`.
///
/// Claiming exports the pin and switches it to output mode, driven low. Dropping the pin drives it
/// low, switches it back to input (floating) and unexports it.
#[derive(Debug)]
pub struct SysfsPin {
    root: PathBuf,
    number: u32,
}

impl SysfsPin {
    /// Exports the GPIO with the given (BCM) number and claims it as a low output.
    pub fn export(root: impl Into<PathBuf>, number: u32) -> Result<SysfsPin, Error> {
        let pin = SysfsPin {
            root: root.into(),
            number,
        };
        if pin.pin_dir().exists() {
            log::warn!("GPIO {} is already exported; claiming it anyway", number);
        } else {
            pin.write(pin.root.join("export"), &number.to_string(), "export")?;
        }
        // "low" switches to output and drives low in one step, without a glitch.
        pin.write(pin.pin_dir().join("direction"), "low", "claim output mode for")?;
        log::trace!("GPIO {} claimed as output", number);
        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.number))
    }

    fn write(&self, path: PathBuf, contents: &str, action: &'static str) -> Result<(), Error> {
        fs::write(path, contents).map_err(|err| Error::PinAccess {
            pin: self.number,
            action,
            source: err,
        })
    }

    /// Every step is attempted even if an earlier one fails; the first failure is returned.
    fn release(&mut self) -> Result<(), Error> {
        let low = self.write(self.pin_dir().join("value"), "0", "drive low");
        let input = self.write(self.pin_dir().join("direction"), "in", "release output mode of");
        let unexport = self.write(self.root.join("unexport"), &self.number.to_string(), "unexport");
        low.and(input).and(unexport)
    }
}

impl ErrorType for SysfsPin {
    type Error = Error;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(self.pin_dir().join("value"), "0", "drive low")
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(self.pin_dir().join("value"), "1", "drive high")
    }
}

impl StatefulOutputPin for SysfsPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        let value = fs::read_to_string(self.pin_dir().join("value")).map_err(|err| {
            Error::PinAccess {
                pin: self.number,
                action: "read back",
                source: err,
            }
        })?;
        Ok(value.trim() == "1")
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_set_high()?)
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        match self.release() {
            Ok(()) => log::trace!("GPIO {} released", self.number),
            Err(err) => log::warn!("Failed to release GPIO {}: {}", self.number, err),
        }
    }
}

/// The set of output pins driven by the controller, keyed by pin number.
///
/// Every pin is driven low when the set is acquired, and again when it is dropped, so outputs are
/// never left active once the set goes out of scope.
pub struct PinSet<TPin>
where
    TPin: OutputPin,
{
    pins: Vec<(u32, TPin)>,
}

impl<TPin> PinSet<TPin>
where
    TPin: OutputPin,
{
    /// Takes ownership of the given pins and drives them all low.
    pub fn acquire(pins: impl IntoIterator<Item = (u32, TPin)>) -> Result<Self, TPin::Error> {
        let mut set = PinSet {
            pins: pins.into_iter().collect(),
        };
        for (_, pin) in set.pins.iter_mut() {
            pin.set_low()?;
        }
        Ok(set)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.pins.iter().map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut TPin)> {
        self.pins.iter_mut().map(|(id, pin)| (*id, pin))
    }

    /// The state of the set straight after [`PinSet::acquire`].
    pub fn initial_state(&self) -> OutputState {
        self.ids().map(|id| (id, PinState::Low)).collect()
    }
}

impl<TPin> PinSet<TPin>
where
    TPin: StatefulOutputPin,
{
    /// Queries each pin for the level it is currently driving.
    pub fn read_back(&mut self) -> Result<OutputState, TPin::Error> {
        let mut levels = Vec::with_capacity(self.pins.len());
        for (id, pin) in self.pins.iter_mut() {
            levels.push((*id, PinState::from(pin.is_set_high()?)));
        }
        Ok(levels.into_iter().collect())
    }
}

impl<TPin> Drop for PinSet<TPin>
where
    TPin: OutputPin,
{
    fn drop(&mut self) {
        for (id, pin) in self.pins.iter_mut() {
            if let Err(err) = pin.set_low() {
                log::warn!("Failed to drive pin {} low on release: {:?}", id, err);
            }
        }
        log::debug!("Released {} output pin(s)", self.pins.len());
    }
}
