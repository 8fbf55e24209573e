use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Returned by every operation issued to a sink that has been closed.
    /// This error is terminal, retries will not be successful.
    #[error("sink closed")]
    Closed,

    /// A mapper transform rejected the message.
    #[error("Transform Error - {0}")]
    Transform(String),

    /// Marshaling a message into its byte payload failed.
    #[error("Marshal Error - {0}")]
    Marshal(String),

    /// The downstream destination rejected the write. Transient; eligible
    /// for retry when a retrying sink is layered on top.
    #[error("Destination Error - {0}")]
    Destination(String),

    /// A lower-level error annotated with the identity of the sink that
    /// observed it.
    #[error("{sink} - {source}")]
    Context {
        sink: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the name of the sink reporting it, keeping the
    /// original error reachable for structural matching.
    pub fn context(self, sink: &'static str) -> Self {
        Error::Context {
            sink,
            source: Box::new(self),
        }
    }

    /// True if the underlying cause is the terminal [`Error::Closed`],
    /// however deeply wrapped. Callers must use this instead of comparing
    /// rendered messages.
    pub fn is_closed(&self) -> bool {
        match self {
            Error::Closed => true,
            Error::Context { source, .. } => source.is_closed(),
            _ => false,
        }
    }
}
