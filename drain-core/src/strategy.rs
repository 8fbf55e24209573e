//! Retry strategies for [`crate::sink::RetryingSink`].

use std::time::Duration;

use crate::error::Error;

pub mod breaker;
pub mod exponential;

pub use breaker::BreakerStrategy;
pub use exponential::{ExponentialBackoff, ExponentialBackoffConfig};

/// Policy deciding retry pacing and drop-vs-retry for a retrying sink.
///
/// All methods must be safe to call from concurrent writers; a single
/// strategy instance may be shared by many tasks.
pub trait RetryStrategy<M>: Send + Sync {
    /// Called before every delivery attempt. A non-zero duration instructs
    /// the retryer to back off by that amount first.
    ///
    /// The message is provided but may be ignored.
    fn proceed(&self, msg: &M) -> Duration;

    /// Records a failed attempt. Returning true instructs the retryer to
    /// drop the message instead of retrying.
    fn failure(&self, msg: &M, err: &Error) -> bool;

    /// Records a successful delivery.
    fn success(&self, msg: &M);
}
