use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::{CloseLatch, Sink};
use crate::error::{Error, Result};
use crate::marshal::Marshaller;

/// Marshals every message and appends the payload, newline-delimited, to
/// the wrapped writer. The writer is flushed on close.
pub struct WriterSink<M, W> {
    latch: CloseLatch,
    out: Mutex<W>,
    marshaller: Marshaller<M>,
}

impl<M, W> WriterSink<M, W>
where
    M: Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(out: W, marshaller: Marshaller<M>) -> Self {
        Self {
            latch: CloseLatch::new(),
            out: Mutex::new(out),
            marshaller,
        }
    }
}

#[async_trait]
impl<M, W> Sink<M> for WriterSink<M, W>
where
    M: Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn write(&self, msg: M) -> Result<()> {
        if self.latch.is_closed() {
            return Err(Error::Closed.context("writer sink"));
        }

        let payload = (self.marshaller)(&msg).map_err(|e| e.context("writer sink"))?;

        let mut out = self.out.lock().await;
        out.write_all(&payload)
            .await
            .map_err(|e| Error::Destination(e.to_string()).context("writer sink"))?;
        out.write_all(b"\n")
            .await
            .map_err(|e| Error::Destination(e.to_string()).context("writer sink"))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut out = self.out.lock().await;
        out.flush()
            .await
            .map_err(|e| Error::Destination(e.to_string()).context("writer sink"))?;
        drop(out);

        self.latch.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::*;
    use crate::marshal;

    #[tokio::test]
    async fn writes_newline_delimited_payloads() {
        let (tx, rx) = tokio::io::duplex(1024);
        let sink = WriterSink::new(tx, marshal::json::<u64>());

        for i in 0..3u64 {
            sink.write(i).await.expect("write should succeed");
        }
        sink.close().await.expect("close should succeed");
        // release the write half so the reader sees EOF
        drop(sink);

        let mut lines = BufReader::new(rx).lines();
        let mut seen = Vec::new();
        while let Some(line) = lines.next_line().await.expect("read should succeed") {
            seen.push(line);
        }
        assert_eq!(seen, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn write_after_close_fails() {
        let (tx, _rx) = tokio::io::duplex(64);
        let sink = WriterSink::new(tx, marshal::json::<u64>());

        sink.close().await.expect("close should succeed");
        sink.close().await.expect("second close should succeed");

        let err = sink.write(1).await.expect_err("write must fail");
        assert!(err.is_closed());
    }
}
