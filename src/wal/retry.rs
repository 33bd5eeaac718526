//! Append retry with backoff
//!
//! Plain [`ObjectWal::append`] never retries. Writers that expect
//! contention can opt into [`ObjectWal::append_with_retry`], which backs off
//! with full jitter, re-derives the frontier from storage and tries again.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::{ObjectWal, Offset};
use crate::error::{Error, Result};

/// Bounded exponential backoff for lost append races
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Backoff ceiling before the first retry
    pub base_backoff: Duration,
    /// Upper bound on any single backoff
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the delay before retry number `retry` (0-based)
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Random delay in `[0, ceiling(retry)]`
    pub fn backoff(&self, retry: u32) -> Duration {
        let ceiling = self.ceiling(retry).as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
    }
}

impl ObjectWal {
    /// Append `data`, recovering from lost races.
    ///
    /// On [`Error::AlreadyExists`] this sleeps, reloads the frontier with
    /// [`ObjectWal::last_record`] and tries the next offset. Any other error,
    /// including one raised by the recovery scan, is returned at once. Once
    /// `max_attempts` is spent the last `AlreadyExists` is returned.
    pub async fn append_with_retry(&self, data: &[u8], policy: &RetryPolicy) -> Result<Offset> {
        let mut attempt: u32 = 1;
        loop {
            match self.append(data).await {
                Err(err @ Error::AlreadyExists { .. }) if attempt < policy.max_attempts => {
                    let delay = policy.backoff(attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Append lost race, recovering frontier: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    self.last_record().await?;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
