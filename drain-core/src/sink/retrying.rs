use std::sync::Arc;

use async_trait::async_trait;

use super::{CloseLatch, Sink, SinkRef, WriteErrorFn, noop_write_error};
use crate::error::{Error, Result};
use crate::strategy::RetryStrategy;

/// Retries writes to the destination until they succeed, the strategy
/// decides to drop, or the sink is closed.
///
/// The destination must have some probability of succeeding or writers
/// block in the retry loop. Each caller retries its own message
/// independently; there is no serialization across concurrent writers
/// beyond what the destination enforces.
pub struct RetryingSink<M> {
    latch: CloseLatch,
    dst: SinkRef<M>,
    strategy: Arc<dyn RetryStrategy<M>>,
    on_drop: WriteErrorFn<M>,
}

impl<M> RetryingSink<M>
where
    M: Clone + Send + 'static,
{
    pub fn new(
        dst: SinkRef<M>,
        strategy: Arc<dyn RetryStrategy<M>>,
        on_drop: Option<WriteErrorFn<M>>,
    ) -> Self {
        Self {
            latch: CloseLatch::new(),
            dst,
            strategy,
            on_drop: on_drop.unwrap_or_else(noop_write_error),
        }
    }
}

#[async_trait]
impl<M> Sink<M> for RetryingSink<M>
where
    M: Clone + Send + 'static,
{
    /// Attempts delivery until it succeeds or the strategy gives up. A
    /// message the strategy decides to drop is reported through the drop
    /// callback and the call still returns success; only the terminal
    /// closed error surfaces to the writer.
    async fn write(&self, msg: M) -> Result<()> {
        loop {
            if self.latch.is_closed() {
                return Err(Error::Closed.context("retrying sink"));
            }

            let backoff = self.strategy.proceed(&msg);
            if !backoff.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = self.latch.closed() => {
                        return Err(Error::Closed.context("retrying sink"));
                    }
                }
            }

            match self.dst.write(msg.clone()).await {
                Ok(()) => {
                    self.strategy.success(&msg);
                    return Ok(());
                }
                // terminal; the destination will never accept this message
                Err(e) if e.is_closed() => return Err(e),
                Err(e) => {
                    if self.strategy.failure(&msg, &e) {
                        (self.on_drop)(msg, &e);
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.dst
            .close()
            .await
            .map_err(|e| e.context("retrying sink"))?;
        self.latch.close();
        Ok(())
    }
}
