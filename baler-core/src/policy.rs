use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

/// Sleep seam so retry timing is testable without real waiting.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, d: Duration);
}

/// Blocks the current thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Bounded retry: at most `max_attempts` tries with a fixed `backoff`
/// between them. No sleeping after the final failure.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or attempts are exhausted, returning
    /// the last error. A `max_attempts` of zero still tries once.
    pub fn run<T, E, F>(
        &self,
        label: &str,
        sleeper: &dyn Sleeper,
        mut op: F,
    ) -> std::result::Result<T, E>
    where
        E: Display,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.max_attempts.max(1) => {
                    warn!(attempt, error = %e, "{} failed, retrying", label);
                    sleeper.sleep(self.backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
