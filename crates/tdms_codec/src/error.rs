//! Error types for the codec crate.

use crate::types::TdsType;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Type magic not present in the catalog.
    #[error("unknown type magic: {magic:#010x}")]
    UnknownType {
        /// The magic number that was not recognized.
        magic: u32,
    },

    /// Type is in the catalog but cannot be decoded.
    #[error("unsupported data type: {ty:?}")]
    UnsupportedType {
        /// The recognized-but-unsupported type.
        ty: TdsType,
    },
}
