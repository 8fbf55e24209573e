use async_trait::async_trait;

use super::{CloseLatch, Sink, SinkRef};
use crate::error::{Error, Result};

/// Forwards to the destination only the messages matching a predicate;
/// everything else is silently dropped, which is not reported as an error.
pub struct FilterSink<M> {
    latch: CloseLatch,
    dst: SinkRef<M>,
    filter: Box<dyn Fn(&M) -> bool + Send + Sync>,
}

impl<M> FilterSink<M>
where
    M: Send + 'static,
{
    pub fn new(dst: SinkRef<M>, filter: impl Fn(&M) -> bool + Send + Sync + 'static) -> Self {
        Self {
            latch: CloseLatch::new(),
            dst,
            filter: Box::new(filter),
        }
    }
}

#[async_trait]
impl<M> Sink<M> for FilterSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("filter sink"));
        }

        if !(self.filter)(&msg) {
            return Ok(());
        }

        self.dst
            .write(msg)
            .await
            .map_err(|e| e.context("filter sink"))
    }

    async fn close(&self) -> Result<()> {
        self.dst
            .close()
            .await
            .map_err(|e| e.context("filter sink"))?;
        self.latch.close();
        Ok(())
    }
}
