use std::io;

use thiserror::Error;

use crate::{compression::CompressionError, config::ConfigError};

/// Caller contract violations. All of them are fatal to the current stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("stream is not open")]
    NotOpen,

    #[error("stream is already open")]
    AlreadyOpen,

    #[error("write after close")]
    WriteAfterClose,

    #[error("segment change declared after close")]
    DeclareAfterClose,

    #[error("single write of {len} bytes does not fit a {capacity}-byte ingest buffer")]
    OversizedWrite { len: usize, capacity: usize },

    #[error("stream already failed; only close is allowed")]
    StreamFailed,
}

/// Unified stream error covering usage, sink I/O, compression and configuration.
/// - `From<T>` impls enable `?` across the writer layers.
/// - Nothing is retried internally; retry policy belongs to the archive writer.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The output sink rejected or partially accepted a write.
    #[error("sink write error: {0}")]
    Sink(#[from] io::Error),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl StreamError {
    /// True when the stream can no longer accept data.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StreamError::Config(_))
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Sink(inner) => inner,
            StreamError::Usage(u) => io::Error::new(io::ErrorKind::InvalidInput, u),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
