//! Error types for the TDMS core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading or writing TDMS files.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tdms_storage::StorageError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] tdms_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A mandatory segment tag is bad or missing, or segment metadata is
    /// structurally unparseable. Fatal: the rest of the file cannot be
    /// trusted.
    #[error("malformed segment header: {message}")]
    MalformedHeader {
        /// Description of the problem.
        message: String,
    },

    /// The file uses an encoding this engine does not support
    /// (big-endian data, DAQmx raw data). Fatal.
    #[error("unsupported encoding: {feature}")]
    UnsupportedEncoding {
        /// The unsupported feature.
        feature: String,
    },

    /// A type magic number absent from the catalog where a byte length
    /// is required to continue parsing.
    #[error("unknown data type magic: {magic:#010x}")]
    UnknownType {
        /// The unrecognized magic number.
        magic: u32,
    },

    /// Operation not valid in the current model state, e.g. querying the
    /// size of an undrained streaming segment or draining a provider
    /// whose values do not match the channel type.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed header error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Creates an unsupported encoding error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedEncoding {
            feature: feature.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}
