use core::fmt;
use embedded_hal::digital::{OutputPin, PinState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ds18b20::Reading;
use crate::gpio::PinSet;

/// How a temperature is compared against the threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// Active strictly above the threshold (`>`).
    #[default]
    Above,
    /// Active at or above the threshold (`>=`).
    AtOrAbove,
}

impl Comparison {
    pub fn is_active(self, fahrenheit: f64, threshold_fahrenheit: f64) -> bool {
        match self {
            Comparison::Above => fahrenheit > threshold_fahrenheit,
            Comparison::AtOrAbove => fahrenheit >= threshold_fahrenheit,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Above => write!(f, ">"),
            Comparison::AtOrAbove => write!(f, ">="),
        }
    }
}

/// The level last applied to each controlled pin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputState {
    levels: BTreeMap<u32, PinState>,
}

impl OutputState {
    pub fn level(&self, pin: u32) -> Option<PinState> {
        self.levels.get(&pin).copied()
    }

    /// Whether any pin is driven high.
    pub fn is_active(&self) -> bool {
        self.levels.values().any(|level| *level == PinState::High)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, PinState)> + '_ {
        self.levels.iter().map(|(pin, level)| (*pin, *level))
    }
}

impl FromIterator<(u32, PinState)> for OutputState {
    fn from_iter<T: IntoIterator<Item = (u32, PinState)>>(iter: T) -> Self {
        OutputState {
            levels: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_active() { "ON" } else { "OFF" })
    }
}

/// A failed [`ThresholdController::update`].
#[derive(Debug, thiserror::Error)]
#[error("failed to drive output pins: {error:?}")]
pub struct UpdateError<TError>
where
    TError: fmt::Debug,
{
    /// The state after the writes that did succeed.
    pub state: OutputState,
    /// The first write error.
    pub error: TError,
}

/// Drives every controlled pin high while the temperature compares above a fixed threshold.
///
/// There is no hysteresis: a temperature hovering at the threshold toggles the outputs on every
/// update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdController {
    threshold_fahrenheit: f64,
    comparison: Comparison,
}

impl ThresholdController {
    pub fn new(threshold_fahrenheit: f64, comparison: Comparison) -> Self {
        ThresholdController {
            threshold_fahrenheit,
            comparison,
        }
    }

    pub fn threshold_fahrenheit(&self) -> f64 {
        self.threshold_fahrenheit
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// The level every pin should be at, given the latest reading or `None` if the read failed.
    pub fn target_level(&self, reading: Option<&Reading>) -> PinState {
        match reading {
            Some(reading)
                if self
                    .comparison
                    .is_active(reading.fahrenheit(), self.threshold_fahrenheit) =>
            {
                PinState::High
            }
            _ => PinState::Low,
        }
    }

    /// Applies the target level to `pins` and returns the resulting state.
    ///
    /// With a reading, a pin is only written when its level in `state` differs from the target.
    /// Without one, every pin is written low regardless of `state`.
    ///
    /// Every pin is attempted even if an earlier write fails. On failure the returned
    /// [`UpdateError`] carries the first error and the state with only the successful writes
    /// applied, so a failed pin keeps its previous level and is written again next time.
    pub fn update<TPin>(
        &self,
        reading: Option<&Reading>,
        pins: &mut PinSet<TPin>,
        state: OutputState,
    ) -> Result<OutputState, UpdateError<TPin::Error>>
    where
        TPin: OutputPin,
    {
        let target = self.target_level(reading);
        let was_active = state.is_active();
        let mut next = state;
        let mut first_error = None;
        for (id, pin) in pins.iter_mut() {
            if reading.is_none() || next.level(id) != Some(target) {
                match pin.set_state(target) {
                    Ok(()) => {
                        next.levels.insert(id, target);
                    }
                    Err(err) => {
                        log::error!("Failed to drive pin {} {:?}: {:?}", id, target, err);
                        first_error.get_or_insert(err);
                    }
                }
            }
        }

        if was_active != next.is_active() {
            match reading {
                Some(reading) if next.is_active() => log::info!(
                    "Temperature {:.1}\u{00B0}F {} {}\u{00B0}F - output ON",
                    reading.fahrenheit(),
                    self.comparison,
                    self.threshold_fahrenheit
                ),
                Some(reading) => log::info!(
                    "Temperature {:.1}\u{00B0}F below threshold {}\u{00B0}F - output OFF",
                    reading.fahrenheit(),
                    self.threshold_fahrenheit
                ),
                None => log::warn!("No valid reading - output forced OFF"),
            }
        }
        match first_error {
            None => Ok(next),
            Some(error) => Err(UpdateError { state: next, error }),
        }
    }
}
