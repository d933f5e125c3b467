//! Linear backoff between initialization attempts.

use std::time::Duration;

/// Delay before the next attempt: `base × attempts_so_far`.
pub fn linear_backoff(attempts_so_far: u32, base: Duration) -> Duration {
    base.saturating_mul(attempts_so_far)
}
