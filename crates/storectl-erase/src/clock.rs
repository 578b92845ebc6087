//! The wall-clock seam a budgeted erase measures its deadline against.
//! Kept injectable, like [`storectl_core::diagnostics`], so tests can
//! drive a deterministic clock instead of real time.

use core::time::Duration;

/// Measures elapsed time since the clock was started.
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

#[cfg(feature = "std")]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn start() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
pub(crate) struct FakeClock {
    pub ticks: core::cell::Cell<Duration>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new() -> Self {
        Self { ticks: core::cell::Cell::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        self.ticks.set(self.ticks.get() + by);
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn elapsed(&self) -> Duration {
        self.ticks.get()
    }
}
