//! Bounded exponential-backoff retry for backend calls
//!
//! Only failures accepted by the policy's transient predicate are retried;
//! everything else (policy rejections, quota, malformed output) fails fast.

use crate::classifier::is_transient;
use crate::events::{EventSink, GenerationEvent};
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::warn;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    backoff_multiplier: f64,
    retryable: fn(&Error) -> bool,
}

impl RetryPolicy {
    /// Build a policy. Delays must strictly increase, so the multiplier has
    /// to be greater than one and the base delay non-zero.
    pub fn new(max_retries: usize, base_delay: Duration, backoff_multiplier: f64) -> Result<Self> {
        if max_retries < 1 {
            return Err(Error::Config("max_retries must be at least 1".to_string()));
        }
        if base_delay.is_zero() {
            return Err(Error::Config("base_delay must be non-zero".to_string()));
        }
        if !(backoff_multiplier > 1.0 && backoff_multiplier.is_finite()) {
            return Err(Error::Config(format!(
                "backoff_multiplier must be greater than 1, got {}",
                backoff_multiplier
            )));
        }

        Ok(Self {
            max_retries,
            base_delay,
            backoff_multiplier,
            retryable: is_transient,
        })
    }

    pub fn with_retryable(mut self, retryable: fn(&Error) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn is_retryable(&self, error: &Error) -> bool {
        (self.retryable)(error)
    }

    /// Delay before retry `n` (zero-based): `base * multiplier^n`.
    pub fn delay_for(&self, n: usize) -> Duration {
        self.base_delay
            .mul_f64(self.backoff_multiplier.powi(n as i32))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |n| self.delay_for(n))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            retryable: is_transient,
        }
    }
}

/// Run `operation`, retrying transient failures per `policy`. The last error
/// is returned unmodified once retries are exhausted.
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, events: &EventSink, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let delays: Vec<Duration> = policy.delays().collect();
    let total = delays.len();
    let schedule = delays.into_iter().enumerate().map(|(n, delay)| {
        warn!(
            "Transient backend failure, retry {}/{} in {:?}",
            n + 1,
            total,
            delay
        );
        events.emit(GenerationEvent::RetryScheduled {
            attempt: n + 1,
            delay,
        });
        delay
    });

    RetryIf::spawn(schedule, operation, |e: &Error| policy.is_retryable(e)).await
}
