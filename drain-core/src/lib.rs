//! In-process, composable message distribution.
//!
//! A pipeline is assembled by composing sinks: producers call `write` on the
//! outermost sink, and each decorator forwards, transforms, buffers, or
//! multiplies the call toward its destination(s). `close` propagates from
//! outermost to innermost, draining in-flight work before closing the chain.
//!
//! ```text
//! (producers) --write--> [broadcast] --+--> [retrying] --> [queue] --> (transport)
//!                                      +--> [filter] -----> [writer] --> (stdout)
//!                                      +--> [channel] <---- (consumer task)
//! ```
//!
//! Delivery is in-memory and best-effort; reliability is layered in
//! explicitly with the queue and retrying sinks rather than built into the
//! contract.

pub mod error;
pub mod marshal;
pub mod sink;
pub mod strategy;

pub use crate::error::{Error, Result};
pub use crate::sink::{Sink, SinkRef, WriteErrorFn};
