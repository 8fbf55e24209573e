//! The sink contract and the concrete sinks built on it.
//!
//! Every component here obeys the same lifecycle: a sink is created open,
//! accepts messages through [`Sink::write`], and transitions to closed
//! exactly once. After `close` returns, every further `write` fails with the
//! terminal closed error; `close` itself is idempotent. Where a sink wraps a
//! destination, closing the sink closes the destination first.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// `/dev/null` for messages.
mod blackhole;

/// Fan-out to a dynamic membership of sinks.
mod broadcast;

/// Bridge between producers and an independent consumer task.
mod channel;

/// One-shot close latch embedded by every sink.
mod closed;

/// Predicate-gated forwarding.
mod filter;

/// Fallible message transformation before forwarding.
mod mapper;

/// Unbounded decoupling queue serviced by a worker pool.
mod queue;

/// Retry-until-success-or-drop delivery.
mod retrying;

/// Newline-delimited marshaled output into any `AsyncWrite`.
mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use blackhole::BlackholeSink;
pub use broadcast::Broadcaster;
pub use channel::ChannelSink;
pub use closed::CloseLatch;
pub use filter::FilterSink;
pub use mapper::MapperSink;
pub use queue::QueueSink;
pub use retrying::RetryingSink;
pub use writer::WriterSink;

/// A component accepting messages for delivery, closable exactly once.
///
/// The trait uses `async_trait` to stay object safe, so pipelines can hold
/// heterogeneous destinations as [`SinkRef`] trait objects.
#[async_trait]
pub trait Sink<M>: Send + Sync
where
    M: Send + 'static,
{
    /// Write a message. Ownership of the value passes to the sink; if no
    /// error is returned the caller may assume the message was accepted.
    async fn write(&self, msg: M) -> Result<()>;

    /// Close the sink, flushing pending messages where the sink guarantees
    /// a drain. Repeated calls succeed silently.
    async fn close(&self) -> Result<()>;
}

/// Shared handle to a sink, the unit of composition for pipelines.
pub type SinkRef<M> = Arc<dyn Sink<M>>;

/// Invoked with the message and the error each time a message is
/// irrecoverably dropped. Never invoked otherwise.
pub type WriteErrorFn<M> = Arc<dyn Fn(M, &Error) + Send + Sync>;

pub(crate) fn noop_write_error<M>() -> WriteErrorFn<M> {
    Arc::new(|_, _| {})
}
