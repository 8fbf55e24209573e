use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;

use super::RetryStrategy;
use crate::error::Error;

/// Configures [`ExponentialBackoff`] bounds.
///
/// The parameters operate on the upper bound for choosing a random value:
/// with `base` of one second, a backoff in `[0, 1s)` is chosen after the
/// first failure.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoffConfig {
    /// Minimum bound for backing off after a failure.
    pub base: Duration,

    /// Amount by which the bound grows with each consecutive failure.
    pub factor: Duration,

    /// Absolute maximum bound for a single backoff.
    pub max: Duration,
}

impl Default for ExponentialBackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: Duration::from_secs(1),
            max: Duration::from_secs(20),
        }
    }
}

/// Random backoff with exponentially increasing bounds as consecutive
/// failures mount.
///
/// After `n` consecutive failures the bound is `base + factor * 2^(n-1)`,
/// capped at the configured maximum; the returned wait is uniformly random
/// in `[0, bound)`. Zero failures means no backoff. A success resets the
/// counter. Never drops messages.
pub struct ExponentialBackoff {
    failures: AtomicU64,
    config: ExponentialBackoffConfig,
}

impl ExponentialBackoff {
    pub fn new(config: ExponentialBackoffConfig) -> Self {
        Self {
            failures: AtomicU64::new(0),
            config,
        }
    }

    /// The random upper bound for the given consecutive-failure count; any
    /// overflow collapses to the configured maximum.
    fn bound(&self, failures: u64) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let defaults = ExponentialBackoffConfig::default();
        let factor = if self.config.factor.is_zero() {
            defaults.factor
        } else {
            self.config.factor
        };
        let max = if self.config.max.is_zero() {
            defaults.max
        } else {
            self.config.max
        };

        let shift = failures - 1;
        let multiplier = if shift < 32 { Some(1u32 << shift) } else { None };

        multiplier
            .and_then(|m| factor.checked_mul(m))
            .and_then(|grown| self.config.base.checked_add(grown))
            .filter(|bound| *bound <= max)
            .unwrap_or(max)
    }
}

impl<M> RetryStrategy<M> for ExponentialBackoff {
    fn proceed(&self, _msg: &M) -> Duration {
        let bound = self.bound(self.failures.load(Ordering::Relaxed));
        if bound.is_zero() {
            return Duration::ZERO;
        }

        // uniformly distributed over [0, bound)
        let nanos = rand::rng().random_range(0..bound.as_nanos() as u64);
        Duration::from_nanos(nanos)
    }

    fn failure(&self, _msg: &M, _err: &Error) -> bool {
        self.failures.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn success(&self, _msg: &M) {
        self.failures.store(0, Ordering::Relaxed);
    }
}
