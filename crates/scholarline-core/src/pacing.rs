//! Randomized delay between consecutive provider requests

use std::time::Duration;

use rand::Rng;

/// Lower bound of the default pacing interval
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);

/// Upper bound of the default pacing interval
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2500);

/// Uniform random delay drawn from `[min, max]` after every item fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacingPolicy {
    min: Duration,
    max: Duration,
}

impl PacingPolicy {
    /// Build a policy, rejecting an inverted interval.
    pub fn new(min: Duration, max: Duration) -> Result<Self, String> {
        if min > max {
            return Err(format!(
                "pacing minimum ({}ms) exceeds maximum ({}ms)",
                min.as_millis(),
                max.as_millis()
            ));
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, String> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// No delay at all
    pub const fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw the next delay
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let ms = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(ms as u64)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_DELAY,
            max: DEFAULT_MAX_DELAY,
        }
    }
}
