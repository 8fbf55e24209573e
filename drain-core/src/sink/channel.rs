use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{CloseLatch, Sink};
use crate::error::{Error, Result};

/// Bridges producers and an independent consumer task.
///
/// [`ChannelSink::new`] hands back the receiving half; the consumer must
/// read it from its own task, racing [`ChannelSink::done`] so it stops once
/// the sink closes:
///
/// ```text
/// loop {
///     tokio::select! {
///         _ = done.cancelled() => break,
///         Some(msg) = rx.recv() => { /* consume */ }
///     }
/// }
/// ```
///
/// Messages still buffered when the sink closes are discarded; there is no
/// drain guarantee.
pub struct ChannelSink<M> {
    latch: CloseLatch,
    // taken exactly once on close so the receiver terminates
    tx: Mutex<Option<mpsc::Sender<M>>>,
}

impl<M> ChannelSink<M>
where
    M: Send + 'static,
{
    /// Builds a channel sink with the given buffer capacity. tokio bounded
    /// channels hold at least one message, so a capacity of zero clamps to
    /// one, the closest rendezvous handoff the runtime offers.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<M>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let sink = Self {
            latch: CloseLatch::new(),
            tx: Mutex::new(Some(tx)),
        };
        (sink, rx)
    }

    /// Completes once the sink is closed. Consumers must stop reading the
    /// receiver when this fires.
    pub fn done(&self) -> CancellationToken {
        self.latch.token()
    }
}

#[async_trait]
impl<M> Sink<M> for ChannelSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("channel sink"));
        }

        let Some(tx) = self.tx.lock().clone() else {
            return Err(Error::Closed.context("channel sink"));
        };

        // race the send against the close so a writer can never block past
        // a Close call
        tokio::select! {
            _ = self.latch.closed() => Err(Error::Closed.context("channel sink")),
            sent = tx.send(msg) => sent.map_err(|_| Error::Closed.context("channel sink")),
        }
    }

    async fn close(&self) -> Result<()> {
        self.latch.close();
        self.tx.lock().take();
        Ok(())
    }
}
