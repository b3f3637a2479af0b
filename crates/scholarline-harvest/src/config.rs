//! Harvest runtime configuration

use scholarline_core::PacingPolicy;

/// Default number of concurrently processed query keys
pub const DEFAULT_WORKERS: usize = 5;

/// Hard upper bound on concurrently processed query keys
pub const MAX_WORKERS: usize = 5;

/// Runtime configuration for a fetch orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Concurrently running query workers, clamped to `1..=MAX_WORKERS`
    pub workers: usize,
    /// Delay between consecutive publication fetches of one worker
    pub pacing: PacingPolicy,
}

impl Config {
    /// Worker threads for a run over `keys` queries (never more than needed)
    pub fn pool_size(&self, keys: usize) -> usize {
        self.workers.clamp(1, MAX_WORKERS).min(keys.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            pacing: PacingPolicy::default(),
        }
    }
}
