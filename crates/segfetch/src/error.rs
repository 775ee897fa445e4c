//! Error types for segfetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Transfer-level failures. Any of these aborts the whole transfer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("cannot determine resource length: {0}")]
    Metadata(String),

    #[error("file I/O error on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("transfer exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("segment task did not complete: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single segment could not be fetched.
///
/// Transport errors are retried within the attempt budget; protocol errors
/// fail the segment immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SegmentError {
    /// Returns `true` if another attempt may succeed.
    pub fn is_retryable(&self) -> bool { matches!(self, SegmentError::Transport(_)) }
}

/// The server answered, but not with the range that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unexpected status {0} (expected 206 Partial Content)")]
    UnexpectedStatus(u16),

    #[error("response is missing the Content-Range header")]
    MissingContentRange,

    #[error("malformed Content-Range header: {0:?}")]
    MalformedContentRange(String),

    #[error("server states a length of {stated} bytes, probe reported {expected}")]
    TotalMismatch { expected: u64, stated: u64 },

    #[error("server confirmed start {confirmed}, requested {requested}")]
    StartMismatch { requested: u64, confirmed: u64 },

    #[error("server confirmed last byte {confirmed}, requested {requested}")]
    EndMismatch { requested: u64, confirmed: u64 },

    #[error("body has {actual} bytes, Content-Range announces {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}
