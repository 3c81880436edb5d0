use embedded_hal::delay::DelayNs;
use std::time::Duration;

/// A delay that returns immediately, keeping track of how long it was asked to wait.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    total_ns: u64,
    calls: usize,
}

impl RecordingDelay {
    pub fn new() -> RecordingDelay {
        RecordingDelay::default()
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += ms as u64 * 1_000_000;
        self.calls += 1;
    }
}
