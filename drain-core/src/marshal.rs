//! Message marshaling helpers.
//!
//! Byte-oriented destinations ([`crate::sink::WriterSink`], transport
//! adapters) take a [`Marshaller`] to turn messages into their wire
//! payload. Marshaling is pure: no side effects, no state.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Error, Result};

/// Converts a message into its byte payload.
pub type Marshaller<M> = Arc<dyn Fn(&M) -> Result<Bytes> + Send + Sync>;

/// Marshals messages as JSON.
pub fn json<M: Serialize>() -> Marshaller<M> {
    Arc::new(|msg| {
        serde_json::to_vec(msg)
            .map(Bytes::from)
            .map_err(|e| Error::Marshal(e.to_string()))
    })
}

/// Marshals messages with their protobuf encoding.
pub fn proto<M: prost::Message>() -> Marshaller<M> {
    Arc::new(|msg| Ok(Bytes::from(msg.encode_to_vec())))
}
