//! Error types for stride-core.

use std::io;
use thiserror::Error;

/// Error type for pipeline setup and streaming.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot allocate frame buffer of {length} samples x {channels} channels")]
    Allocation { length: usize, channels: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Source read failed at hop {hop} (requested {requested} samples): {source}")]
    SourceRead {
        hop: u64,
        requested: usize,
        #[source]
        source: io::Error,
    },

    #[error("Sink write failed at hop {hop} ({requested} samples): {source}")]
    SinkWrite {
        hop: u64,
        requested: usize,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error came from the stream collaborators rather than setup.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Error::SourceRead { .. } | Error::SinkWrite { .. })
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_read_message_has_context() {
        let err = Error::SourceRead {
            hop: 12,
            requested: 256,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"),
        };
        let msg = err.to_string();
        assert!(msg.contains("hop 12"));
        assert!(msg.contains("256"));
        assert!(err.is_stream_error());
    }

    #[test]
    fn test_allocation_is_not_stream_error() {
        let err = Error::Allocation {
            length: 0,
            channels: 2,
        };
        assert!(!err.is_stream_error());
        assert!(err.to_string().contains("0 samples x 2 channels"));
    }
}
