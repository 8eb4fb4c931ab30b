//! Bounded repeat-until-done polling.

use std::future::Future;
use std::time::Duration;

/// How often and how long a check is repeated until it observes a terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

/// Result of running a [`PollPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The check returned a terminal value on attempt `attempts`.
    Completed { value: T, attempts: u32 },
    /// Every attempt returned a non-terminal value.
    Exhausted { attempts: u32 },
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval: Duration::from_secs(10),
        }
    }
}

impl PollPolicy {
    /// At most `max_attempts` checks, `interval` apart.
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound of the time spent sleeping by one [`PollPolicy::run`].
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }

    /// Call `check` until `is_terminal` accepts its value or the attempts run out.
    ///
    /// Sleeps `interval` between non-terminal observations, never after the last one.
    /// A check error ends polling immediately and is returned as is.
    pub async fn run<T, E, F, Fut, P>(&self, mut check: F, is_terminal: P) -> Result<PollOutcome<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            let value = check().await?;
            if is_terminal(&value) {
                return Ok(PollOutcome::Completed {
                    value,
                    attempts: attempt,
                });
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(PollOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
