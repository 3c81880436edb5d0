use super::concurrent;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use w1_thermostat::threshold::UpdateError;

pub use super::concurrent::PinRecord;

#[derive(Debug, PartialEq)]
pub enum Error {
    WriteFailed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fake pin write failed")
    }
}

impl std::error::Error for Error {}

impl From<UpdateError<Error>> for Error {
    fn from(err: UpdateError<Error>) -> Error {
        err.error
    }
}

impl digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An output pin that records every write under its name.
#[derive(Debug)]
pub struct Pin {
    name: &'static str,
}

impl Pin {
    pub fn new(name: &'static str) -> Pin {
        concurrent::reset_named_record(name);
        Pin { name: name }
    }

    fn write(&mut self, high: bool) -> Result<(), Error> {
        if concurrent::get_named_record(self.name).fail_writes {
            return Err(Error::WriteFailed);
        }
        concurrent::record_named_write(self.name, high);
        Ok(())
    }
}

/// Makes every later write to the named pin fail, or succeed again.
pub fn set_fail_writes(name: &'static str, fail: bool) {
    concurrent::set_named_fail_writes(name, fail);
}

/// Everything recorded for the pin with the given name.
pub fn record(name: &str) -> PinRecord {
    concurrent::get_named_record(name)
}

impl ErrorType for Pin {
    type Error = Error;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl StatefulOutputPin for Pin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(concurrent::get_named_record(self.name).high == Some(true))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_set_high()?)
    }
}

impl Drop for Pin {
    fn drop(&mut self) {
        concurrent::record_named_drop(self.name);
    }
}
