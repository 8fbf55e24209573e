//! Fan-out of one message stream to a dynamic membership of sinks.
//!
//! All membership state is owned exclusively by a coordinator task; writes,
//! adds and removes are funneled through request channels, so iteration for
//! dispatch needs no lock and membership changes are the rare path. This is
//! the [Actor Pattern]: the only way to touch the membership is a message to
//! the coordinator.
//!
//! [Actor Pattern]: https://ryhl.io/blog/actors-with-tokio/

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{CloseLatch, Sink, SinkRef, WriteErrorFn, noop_write_error};
use crate::error::{Error, Result};

/// Sends every written message to each member of a dynamic set of sinks.
///
/// Members should accept all messages and handle reliability on their own;
/// wrap them in [`super::QueueSink`] and [`super::RetryingSink`] as needed.
/// A member that reports the terminal closed error is evicted from the
/// membership; any other member error is reported through the write-error
/// callback and never fails the caller's `write`.
pub struct Broadcaster<M> {
    latch: CloseLatch,
    messages: mpsc::Sender<M>,
    adds: mpsc::Sender<ConfigureRequest<M>>,
    removes: mpsc::Sender<ConfigureRequest<M>>,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

struct ConfigureRequest<M> {
    sink: SinkRef<M>,
    respond_to: oneshot::Sender<()>,
}

impl<M> Broadcaster<M>
where
    M: Clone + Send + 'static,
{
    /// Starts the coordinator task with `to` as the initial membership.
    pub fn new(on_write_error: Option<WriteErrorFn<M>>, to: Vec<SinkRef<M>>) -> Self {
        let latch = CloseLatch::new();
        let (msg_tx, msg_rx) = mpsc::channel(1);
        let (add_tx, add_rx) = mpsc::channel(1);
        let (remove_tx, remove_rx) = mpsc::channel(1);

        let coordinator = Coordinator {
            members: to,
            messages: msg_rx,
            adds: add_rx,
            removes: remove_rx,
            latch: latch.clone(),
            on_write_error: on_write_error.unwrap_or_else(noop_write_error),
        };

        Self {
            latch,
            messages: msg_tx,
            adds: add_tx,
            removes: remove_tx,
            coordinator: Mutex::new(Some(tokio::spawn(coordinator.run()))),
        }
    }

    /// Adds a sink to the membership. Adding a sink that is already a member
    /// is a no-op; membership identity is pointer identity of the handle.
    pub async fn add(&self, sink: SinkRef<M>) -> Result<()> {
        self.configure(&self.adds, sink).await
    }

    /// Removes a sink from the membership.
    pub async fn remove(&self, sink: SinkRef<M>) -> Result<()> {
        self.configure(&self.removes, sink).await
    }

    async fn configure(
        &self,
        requests: &mpsc::Sender<ConfigureRequest<M>>,
        sink: SinkRef<M>,
    ) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("broadcast sink"));
        }

        let (tx, rx) = oneshot::channel();
        let request = ConfigureRequest {
            sink,
            respond_to: tx,
        };

        tokio::select! {
            _ = self.latch.closed() => return Err(Error::Closed.context("broadcast sink")),
            sent = requests.send(request) => {
                if sent.is_err() {
                    return Err(Error::Closed.context("broadcast sink"));
                }
            }
        }

        // a close racing the request may stop the coordinator before it
        // replies; surface that as the terminal error
        rx.await.map_err(|_| Error::Closed.context("broadcast sink"))
    }
}

#[async_trait]
impl<M> Sink<M> for Broadcaster<M>
where
    M: Clone + Send + 'static,
{
    /// Hands the message to the coordinator for dispatch to every current
    /// member. Once accepted, delivery is best-effort and the call never
    /// fails; the caller cedes the message to the broadcaster.
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("broadcast sink"));
        }

        tokio::select! {
            _ = self.latch.closed() => Err(Error::Closed.context("broadcast sink")),
            sent = self.messages.send(msg) => sent.map_err(|_| Error::Closed.context("broadcast sink")),
        }
    }

    /// Closes every member best-effort, then the broadcaster itself.
    /// Messages accepted before the close are dispatched first; returns
    /// once the coordinator has exited.
    async fn close(&self) -> Result<()> {
        self.latch.close();

        let handle = self.coordinator.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "broadcast coordinator task failed");
            }
        }

        Ok(())
    }
}

/// Owns the membership; everything else talks to it through channels.
struct Coordinator<M> {
    members: Vec<SinkRef<M>>,
    messages: mpsc::Receiver<M>,
    adds: mpsc::Receiver<ConfigureRequest<M>>,
    removes: mpsc::Receiver<ConfigureRequest<M>>,
    latch: CloseLatch,
    on_write_error: WriteErrorFn<M>,
}

impl<M> Coordinator<M>
where
    M: Clone + Send + 'static,
{
    async fn run(mut self) {
        loop {
            tokio::select! {
                // polled in order: an accepted write is always dispatched
                // before a membership request issued after it
                biased;

                _ = self.latch.closed() => {
                    // refuse new handoffs, then dispatch whatever producers
                    // handed over before the close so an accepted write is
                    // never lost
                    self.messages.close();
                    while let Ok(msg) = self.messages.try_recv() {
                        self.dispatch(msg).await;
                    }
                    self.close_members().await;
                    return;
                }
                Some(msg) = self.messages.recv() => self.dispatch(msg).await,
                Some(request) = self.adds.recv() => {
                    self.add(request.sink);
                    let _ = request.respond_to.send(());
                }
                Some(request) = self.removes.recv() => {
                    self.remove(&request.sink);
                    let _ = request.respond_to.send(());
                }
            }
        }
    }

    /// One atomic dispatch event: the message goes to the membership in
    /// effect right now.
    async fn dispatch(&mut self, msg: M) {
        let mut i = 0;
        while i < self.members.len() {
            match self.members[i].write(msg.clone()).await {
                Ok(()) => i += 1,
                Err(e) if e.is_closed() => {
                    // no further dispatch attempts to a closed member
                    info!("evicting closed sink from broadcast membership");
                    self.members.remove(i);
                }
                Err(e) => {
                    (self.on_write_error)(msg.clone(), &e);
                    i += 1;
                }
            }
        }
    }

    fn add(&mut self, sink: SinkRef<M>) {
        if !self.members.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            self.members.push(sink);
        }
    }

    fn remove(&mut self, sink: &SinkRef<M>) {
        self.members.retain(|s| !Arc::ptr_eq(s, sink));
    }

    async fn close_members(&mut self) {
        for sink in self.members.drain(..) {
            if let Err(e) = sink.close().await {
                if !e.is_closed() {
                    warn!(error = %e, "error closing broadcast member sink");
                }
            }
        }
    }
}
