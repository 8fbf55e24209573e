use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use super::{CloseLatch, Sink, SinkRef, WriteErrorFn, noop_write_error};
use crate::error::{Error, Result};

/// Decouples producers from a (possibly slow) destination through an
/// unbounded in-memory queue serviced by a pool of worker tasks.
///
/// The queue is unbounded: producers are never backpressured, so the
/// destination must be reliable (or wrapped in a [`super::RetryingSink`]) or
/// memory grows without bound while it is slow. A destination write error
/// drops the message and reports it through the drop callback; this sink
/// performs no retries of its own.
///
/// Workers dequeue from a shared channel; once the queue is closing and
/// drained, `recv` yields the terminal `None` that tells each worker to
/// exit. Delivery order matches enqueue order only with a single worker.
pub struct QueueSink<M> {
    latch: CloseLatch,
    dst: SinkRef<M>,
    // taken on close so workers drain the backlog and exit
    messages: Mutex<Option<mpsc::UnboundedSender<M>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    // serializes closers so only one drains and the rest observe the latch
    close_guard: tokio::sync::Mutex<()>,
}

impl<M> QueueSink<M>
where
    M: Clone + Send + 'static,
{
    /// Builds a queue draining into `dst` with `throughput` worker tasks.
    /// A throughput of zero is treated as one.
    pub fn new(dst: SinkRef<M>, throughput: usize, on_drop: Option<WriteErrorFn<M>>) -> Self {
        let on_drop = on_drop.unwrap_or_else(noop_write_error);
        let (tx, rx) = mpsc::unbounded_channel::<M>();
        let receiver = Arc::new(tokio::sync::Mutex::new(rx));

        let mut workers = Vec::new();
        for _ in 0..throughput.max(1) {
            let receiver = Arc::clone(&receiver);
            let dst = Arc::clone(&dst);
            let on_drop = Arc::clone(&on_drop);

            workers.push(tokio::spawn(async move {
                loop {
                    // hold the lock only while dequeuing so other workers
                    // keep making progress during the destination write
                    let next = { receiver.lock().await.recv().await };
                    let Some(msg) = next else {
                        // queue closed and fully drained
                        return;
                    };

                    if let Err(e) = dst.write(msg.clone()).await {
                        (on_drop)(msg, &e);
                    }
                }
            }));
        }

        Self {
            latch: CloseLatch::new(),
            dst,
            messages: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            close_guard: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl<M> Sink<M> for QueueSink<M>
where
    M: Clone + Send + 'static,
{
    /// Accepts the message into the queue, failing only if the queue has
    /// been closed.
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("queue sink"));
        }

        match self.messages.lock().as_ref() {
            Some(tx) => tx
                .send(msg)
                .map_err(|_| Error::Closed.context("queue sink")),
            None => Err(Error::Closed.context("queue sink")),
        }
    }

    /// Stops intake, waits for the workers to drain every queued message
    /// and exit, then closes the destination.
    async fn close(&self) -> Result<()> {
        let _guard = self.close_guard.lock().await;
        if self.latch.is_closed() {
            return Ok(());
        }

        // dropping the sender is the drain signal: workers keep dequeuing
        // until the channel is empty, then observe the terminal None
        self.messages.lock().take();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "queue worker task failed");
            }
        }

        self.dst
            .close()
            .await
            .map_err(|e| e.context("queue sink"))?;
        self.latch.close();
        Ok(())
    }
}
