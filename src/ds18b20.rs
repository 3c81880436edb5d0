use core::fmt;
use core::num::ParseIntError;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use std::io;

/// The maximum number of reads made by [`read_temperature`], including the first.
pub const MAX_ATTEMPTS: u8 = 5;

/// How long to wait before re-reading a sensor that reported a conversion as not ready.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// The worst-case conversion time of the sensor, in 12-bit mode.
pub const CONVERSION_TIME_12BIT: Duration = Duration::from_millis(750);

// The retries must outlast a full conversion.
const _: () = assert!(
    RETRY_BACKOFF.as_millis() * MAX_ATTEMPTS as u128 >= CONVERSION_TIME_12BIT.as_millis()
);

/// Trailing token of the first line once the scratchpad CRC has been checked.
const CRC_VALID_MARKER: &str = "YES";
const TEMPERATURE_MARKER: &str = "t=";
const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device file held fewer than the two expected lines.
    #[error("malformed reading: expected 2 lines, got {lines}")]
    MalformedReading { lines: usize },
    /// The CRC status never became `YES`.
    #[error("sensor not ready after {attempts} attempts")]
    SensorNotReady { attempts: u8 },
    /// The second line had no `t=` field.
    #[error("temperature field 't=' missing from '{line}'")]
    TemperaturePatternMissing { line: String },
    /// The `t=` field was not an integer.
    #[error("could not convert temperature value '{value}': {source}")]
    TemperatureParseError {
        value: String,
        source: ParseIntError,
    },
}

/// Anything that yields the text the kernel exports for the sensor.
///
/// Each call is expected to reflect the sensor's latest state, i.e. re-open the device file
/// rather than replay a buffer.
pub trait RawSource {
    fn read_raw(&mut self) -> io::Result<String>;
}

/// A temperature read from the sensor, in both scales.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    celsius: f64,
    fahrenheit: f64,
}

impl Reading {
    /// Converts the raw milli-degrees Celsius value reported by the kernel.
    pub fn from_millidegrees(millidegrees: i64) -> Self {
        let celsius = millidegrees as f64 / MILLIDEGREES_PER_DEGREE;
        Reading {
            celsius,
            fahrenheit: celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    pub fn fahrenheit(&self) -> f64 {
        self.fahrenheit
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}\u{00B0}C / {:.1}\u{00B0}F",
            self.celsius, self.fahrenheit
        )
    }
}

/// Reads the temperature, waiting out conversions that are still in progress.
///
/// The kernel re-runs a conversion whenever the device file is read, and reports whether the
/// scratchpad CRC matched with a trailing `YES` or `NO` on the first line. While it reports `NO`,
/// this waits [`RETRY_BACKOFF`] and reads again, up to [`MAX_ATTEMPTS`] reads in total. A read with
/// fewer than two lines fails immediately, without retrying.
///
/// Failing to open the device file counts as a not-ready attempt.
pub fn read_temperature<TSource, TDelay>(
    source: &mut TSource,
    delay: &mut TDelay,
) -> Result<Reading, Error>
where
    TSource: RawSource + ?Sized,
    TDelay: DelayNs,
{
    let mut attempt = 1u8;
    loop {
        match source.read_raw() {
            Ok(text) => {
                let lines: Vec<&str> = text.lines().collect();
                if lines.len() < 2 {
                    return Err(Error::MalformedReading { lines: lines.len() });
                }
                if is_crc_valid(lines[0]) {
                    return parse_temperature_line(lines[1]);
                }
                log::trace!("Conversion not ready on attempt {}", attempt);
            }
            Err(err) => {
                log::warn!("Could not read sensor file on attempt {}: {}", attempt, err);
            }
        }

        if attempt >= MAX_ATTEMPTS {
            return Err(Error::SensorNotReady { attempts: attempt });
        }
        delay.delay_ms(RETRY_BACKOFF.as_millis() as u32);
        attempt += 1;
    }
}

/// Parses a single, complete device text without retrying.
///
/// Returns [`Error::SensorNotReady`] after one attempt if the CRC status is not `YES`.
pub fn parse_reading(text: &str) -> Result<Reading, Error> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return Err(Error::MalformedReading { lines: lines.len() });
    }
    if !is_crc_valid(lines[0]) {
        return Err(Error::SensorNotReady { attempts: 1 });
    }
    parse_temperature_line(lines[1])
}

fn is_crc_valid(status_line: &str) -> bool {
    status_line.split_whitespace().last() == Some(CRC_VALID_MARKER)
}

fn parse_temperature_line(line: &str) -> Result<Reading, Error> {
    let start = line
        .find(TEMPERATURE_MARKER)
        .ok_or_else(|| Error::TemperaturePatternMissing {
            line: line.to_owned(),
        })?;
    let value = line[start + TEMPERATURE_MARKER.len()..].trim();
    let millidegrees = value
        .parse::<i64>()
        .map_err(|err| Error::TemperatureParseError {
            value: value.to_owned(),
            source: err,
        })?;
    Ok(Reading::from_millidegrees(millidegrees))
}
