//! Shared test doubles for sink tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CloseLatch, Sink, SinkRef};
use crate::error::{Error, Result};

/// Records every message written to it; honors the closed contract.
pub(crate) struct RecordingSink<M> {
    latch: CloseLatch,
    messages: Mutex<Vec<M>>,
}

impl<M> RecordingSink<M> {
    pub(crate) fn new() -> Self {
        Self {
            latch: CloseLatch::new(),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn messages(&self) -> Vec<M>
    where
        M: Clone,
    {
        self.messages.lock().clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.latch.is_closed()
    }
}

#[async_trait]
impl<M> Sink<M> for RecordingSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed);
        }
        self.messages.lock().push(msg);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.latch.close();
        Ok(())
    }
}

/// Fails every write with a destination error, counting the attempts.
pub(crate) struct FailingSink {
    latch: CloseLatch,
    attempts: AtomicUsize,
}

impl FailingSink {
    pub(crate) fn new() -> Self {
        Self {
            latch: CloseLatch::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<M> Sink<M> for FailingSink
where
    M: Send + 'static,
{
    async fn write(&self, _msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed);
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Destination("always failing".to_string()))
    }

    async fn close(&self) -> Result<()> {
        self.latch.close();
        Ok(())
    }
}

/// Fails the first `failures` writes, then delegates to the inner sink.
pub(crate) struct FlakySink<M> {
    inner: SinkRef<M>,
    remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl<M> FlakySink<M> {
    pub(crate) fn new(inner: SinkRef<M>, failures: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<M> Sink<M> for FlakySink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let mut remaining = self.remaining.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.remaining.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(Error::Destination("flaky".to_string())),
                Err(actual) => remaining = actual,
            }
        }

        self.inner.write(msg).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

/// Delays every write, then delegates to the inner sink.
pub(crate) struct DelayedSink<M> {
    inner: SinkRef<M>,
    delay: Duration,
}

impl<M> DelayedSink<M> {
    pub(crate) fn new(inner: SinkRef<M>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<M> Sink<M> for DelayedSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.write(msg).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

/// Asserts the shared close contract: close twice succeeds, a write after
/// the first close fails with the terminal closed error.
pub(crate) async fn check_close<M, S>(sink: &S, probe: M)
where
    M: Send + 'static,
    S: Sink<M>,
{
    sink.close().await.expect("close should succeed");
    sink.close().await.expect("second close should succeed");

    let err = sink
        .write(probe)
        .await
        .expect_err("write after close must fail");
    assert!(err.is_closed(), "expected closed error, got: {err}");
}
