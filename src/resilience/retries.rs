//! Retry loop for transient failures.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times
//! - Sleep `delay × attempts so far` after each transient failure
//! - Stop at the first non-transient failure

use std::sync::Mutex;
use std::time::Duration;

use crate::resilience::backoff::linear_backoff;

/// Blocking sleep used between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Attempt limit and base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// The error that ended the loop and how many attempts were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it succeeds, fails non-transiently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. At least one attempt is
    /// always made, even with `max_attempts == 0`.
    pub fn run<T, E>(
        &self,
        sleeper: &dyn Sleeper,
        is_transient: impl Fn(&E) -> bool,
        mut op: impl FnMut(u32) -> Result<T, E>,
    ) -> Result<T, RetryFailure<E>> {
        let limit = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) if is_transient(&error) && attempt < limit => {
                    let delay = linear_backoff(attempt, self.delay);
                    tracing::debug!(
                        attempt,
                        max_attempts = limit,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying"
                    );
                    sleeper.sleep(delay);
                    attempt += 1;
                }
                Err(error) => {
                    return Err(RetryFailure {
                        error,
                        attempts: attempt,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Transient,
        Fatal,
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1))
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let sleeper = RecordingSleeper::new();
        let result = policy().run(&sleeper, |e| *e == Failure::Transient, |attempt| {
            if attempt < 3 {
                Err(Failure::Transient)
            } else {
                Ok(attempt)
            }
        });

        assert_eq!(result, Ok(3));
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_gives_up_after_limit() {
        let sleeper = RecordingSleeper::new();
        let mut calls = 0;
        let result: Result<(), _> = policy().run(&sleeper, |e| *e == Failure::Transient, |_| {
            calls += 1;
            Err(Failure::Transient)
        });

        assert_eq!(
            result,
            Err(RetryFailure {
                error: Failure::Transient,
                attempts: 3
            })
        );
        assert_eq!(calls, 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[test]
    fn test_fatal_failure_aborts() {
        let sleeper = RecordingSleeper::new();
        let result: Result<(), _> =
            policy().run(&sleeper, |e| *e == Failure::Transient, |_| Err(Failure::Fatal));

        assert_eq!(result.unwrap_err().attempts, 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn test_zero_limit_still_attempts_once() {
        let sleeper = RecordingSleeper::new();
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let result: Result<(), _> = policy.run(&sleeper, |_: &Failure| true, |_| Err(Failure::Transient));
        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
