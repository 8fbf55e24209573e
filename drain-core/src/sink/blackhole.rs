use async_trait::async_trait;

use super::{CloseLatch, Sink};
use crate::error::{Error, Result};

/// Accepts every message and delivers nowhere, the semantic equivalent of
/// `/dev/null`. Useful as a pipeline terminator in tests and benchmarks.
#[derive(Default)]
pub struct BlackholeSink {
    latch: CloseLatch,
}

impl BlackholeSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<M> Sink<M> for BlackholeSink
where
    M: Send + 'static,
{
    async fn write(&self, _msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("blackhole sink"));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.latch.close();
        Ok(())
    }
}
