use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_kinesis::Client;
use aws_sdk_kinesis::primitives::Blob;
use drain_core::error::{Error as SinkError, Result as SinkResult};
use drain_core::marshal::Marshaller;
use drain_core::sink::{CloseLatch, Sink, WriteErrorFn};

use crate::{Error, Result};

pub const KINESIS_DEFAULT_REGION: &str = "us-west-2";

const MIN_PUT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_PUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the Kinesis sink.
#[derive(Clone, Debug, PartialEq)]
pub struct KinesisSinkConfig {
    /// AWS region where the stream lives.
    pub region: String,
    /// Name of the Kinesis stream.
    pub stream_name: String,
}

/// Builder for [`KinesisSink`].
pub struct KinesisSinkBuilder<M> {
    config: KinesisSinkConfig,
    client: Option<Client>,
    marshaller: Option<Marshaller<M>>,
    timeout: Duration,
    on_error: Option<WriteErrorFn<M>>,
}

impl<M> KinesisSinkBuilder<M>
where
    M: Send + 'static,
{
    pub fn new(config: KinesisSinkConfig) -> Self {
        Self {
            config,
            client: None,
            marshaller: None,
            timeout: DEFAULT_PUT_TIMEOUT,
            on_error: None,
        }
    }

    /// Uses a preconfigured client instead of building one from the
    /// environment.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn marshaller(mut self, marshaller: Marshaller<M>) -> Self {
        self.marshaller = Some(marshaller);
        self
    }

    /// Budget for a single put, including marshaled payload transfer.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invoked with the message and error on every failed put.
    pub fn on_error(mut self, on_error: WriteErrorFn<M>) -> Self {
        self.on_error = Some(on_error);
        self
    }

    pub async fn build(self) -> Result<KinesisSink<M>> {
        if self.config.stream_name.is_empty() {
            return Err(Error::InvalidConfig(
                "a kinesis stream name must be provided".to_string(),
            ));
        }

        let Some(marshaller) = self.marshaller else {
            return Err(Error::InvalidConfig(
                "a marshaller function must be provided".to_string(),
            ));
        };

        if self.timeout < MIN_PUT_TIMEOUT {
            return Err(Error::InvalidConfig(format!(
                "a timeout of at least {MIN_PUT_TIMEOUT:?} must be provided, got {:?}",
                self.timeout
            )));
        }

        let client = match self.client {
            Some(client) => client,
            None => crate::create_kinesis_client(&self.config).await,
        };

        Ok(KinesisSink {
            latch: CloseLatch::new(),
            client,
            stream_name: self.config.stream_name,
            marshaller,
            timeout: self.timeout,
            on_error: self.on_error.unwrap_or_else(|| std::sync::Arc::new(|_, _| {})),
        })
    }
}

/// Sends marshaled messages to a Kinesis stream.
///
/// Each record is put under a random (UUID) partition key, spreading
/// messages across shards; callers needing ordered shards should front this
/// sink with a single-worker queue.
pub struct KinesisSink<M> {
    latch: CloseLatch,
    client: Client,
    stream_name: String,
    marshaller: Marshaller<M>,
    timeout: Duration,
    on_error: WriteErrorFn<M>,
}

#[async_trait]
impl<M> Sink<M> for KinesisSink<M>
where
    M: Send + 'static,
{
    async fn write(&self, msg: M) -> SinkResult<()> {
        if self.latch.is_closed() {
            return Err(SinkError::Closed.context("kinesis sink"));
        }

        let data = (self.marshaller)(&msg).map_err(|e| e.context("kinesis sink"))?;

        let put = self
            .client
            .put_record()
            .stream_name(&self.stream_name)
            .partition_key(uuid::Uuid::new_v4().to_string())
            .data(Blob::new(data.to_vec()))
            .send();

        match tokio::time::timeout(self.timeout, put).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                let err = SinkError::Destination(Error::Kinesis(e.into()).to_string())
                    .context("kinesis sink");
                (self.on_error)(msg, &err);
                Err(err)
            }
            Err(_) => {
                let err = SinkError::Destination(Error::Timeout(self.timeout).to_string())
                    .context("kinesis sink");
                (self.on_error)(msg, &err);
                Err(err)
            }
        }
    }

    async fn close(&self) -> SinkResult<()> {
        self.latch.close();
        Ok(())
    }
}
