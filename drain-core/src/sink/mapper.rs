use async_trait::async_trait;

use super::{CloseLatch, Sink, SinkRef};
use crate::error::{Error, Result};

/// Applies a fallible transform to every message before forwarding it.
///
/// A transform failure is propagated to the writer and the message is not
/// forwarded.
pub struct MapperSink<M> {
    latch: CloseLatch,
    dst: SinkRef<M>,
    mapper: Box<dyn Fn(M) -> Result<M> + Send + Sync>,
}

impl<M> MapperSink<M>
where
    M: Send + 'static,
{
    pub fn new(dst: SinkRef<M>, mapper: impl Fn(M) -> Result<M> + Send + Sync + 'static) -> Self {
        Self {
            latch: CloseLatch::new(),
            dst,
            mapper: Box::new(mapper),
        }
    }
}

#[async_trait]
impl<M> Sink<M> for MapperSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("mapper sink"));
        }

        let mapped = (self.mapper)(msg).map_err(|e| e.context("mapper sink"))?;

        self.dst
            .write(mapped)
            .await
            .map_err(|e| e.context("mapper sink"))
    }

    async fn close(&self) -> Result<()> {
        self.dst
            .close()
            .await
            .map_err(|e| e.context("mapper sink"))?;
        self.latch.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sink::test_utils::{RecordingSink, check_close};

    #[tokio::test]
    async fn forwards_transformed_messages() {
        let recording = Arc::new(RecordingSink::new());
        let mapper = MapperSink::new(Arc::clone(&recording) as SinkRef<String>, |msg: String| {
            Ok(msg.to_uppercase())
        });

        mapper
            .write("hello".to_string())
            .await
            .expect("write should succeed");

        assert_eq!(recording.messages(), vec!["HELLO".to_string()]);
    }

    #[tokio::test]
    async fn transform_failure_is_propagated_without_forwarding() {
        let recording = Arc::new(RecordingSink::new());
        let mapper = MapperSink::new(Arc::clone(&recording) as SinkRef<String>, |_: String| {
            Err(Error::Transform("unmappable".to_string()))
        });

        let err = mapper
            .write("hello".to_string())
            .await
            .expect_err("transform failure should surface");
        assert!(matches!(
            err,
            Error::Context {
                sink: "mapper sink",
                ..
            }
        ));
        assert!(!err.is_closed());
        assert!(recording.messages().is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_closes_destination() {
        let recording = Arc::new(RecordingSink::new());
        let mapper = MapperSink::new(Arc::clone(&recording) as SinkRef<String>, Ok);

        check_close(&mapper, "probe".to_string()).await;
        assert!(recording.is_closed());
    }
}
