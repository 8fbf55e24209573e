//! AWS Kinesis destination for the sink distribution engine.
//!
//! Wraps the AWS SDK client as a [`drain_core::Sink`]: messages are
//! marshaled and put onto a Kinesis stream under a caller-supplied timeout.
//! The crate owns only timeout scoping and error wrapping; partitioning and
//! the transport's own retry semantics stay with the SDK. Layer a
//! `RetryingSink` on top for delivery-level retries.

use std::time::Duration;

mod client;
mod sink;

pub use client::create_kinesis_client;
pub use sink::{KinesisSink, KinesisSinkBuilder, KinesisSinkConfig};

/// Errors raised while configuring or talking to Kinesis.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed with Kinesis error - {0}")]
    Kinesis(#[from] aws_sdk_kinesis::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Put record timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_error_conversion() {
        let err: Error = "custom error message".to_string().into();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.to_string(), "custom error message");
    }

    #[test]
    fn timeout_error_mentions_the_duration() {
        let err = Error::Timeout(Duration::from_secs(3));
        assert!(err.to_string().contains("3s"));
    }
}
