//! Cooperative cancellation via a shared atomic flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Granularity of [`CancellationToken::sleep`] polling
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Stop signal shared between the control side and all workers of a run.
///
/// Cloning is cheap and every clone observes the same flag. Workers poll
/// [`is_set`](Self::is_set) between units of work; nothing is preempted.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to unset (start of a new run)
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Request a stop. Idempotent.
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Set the flag, returning whether it was already set.
    ///
    /// Async-signal-safe; signal handlers use this to detect a second Ctrl-C.
    pub fn swap_set(&self) -> bool {
        self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early once the token is set.
    ///
    /// Returns `true` if the sleep was cut short by cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_set() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear() {
        let token = CancellationToken::new();
        assert!(!token.is_set());
        token.set();
        assert!(token.is_set());
        token.clear();
        assert!(!token.is_set());
    }

    #[test]
    fn set_is_idempotent() {
        let token = CancellationToken::new();
        token.set();
        token.set();
        assert!(token.is_set());
        assert!(token.swap_set());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.set();
        assert!(token.is_set());
    }

    #[test]
    fn sleep_runs_full_duration_when_unset() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_millis(60)));
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn sleep_wakes_on_cancel() {
        let token = CancellationToken::new();
        let setter = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            setter.set();
        });

        let start = Instant::now();
        assert!(token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }
}
