//! # TDMS Codec
//!
//! On-disk type catalog and little-endian value codec for the TDMS engine.
//!
//! This crate knows how individual values look on the wire:
//! - The fixed catalog of TDMS data types and their magic numbers
//! - Little-endian encoding of every supported primitive
//! - Length-prefixed strings (4-byte length + UTF-8 bytes)
//! - 16-byte timestamps on the 1904 epoch
//!
//! It deliberately knows nothing about segments, lead-ins, or channels -
//! that structure lives in `tdms_core`.
//!
//! ## Usage
//!
//! ```
//! use tdms_codec::{Decoder, Encoder, TdsType, Value};
//!
//! let mut encoder = Encoder::new();
//! encoder.put_value(&Value::I32(-42));
//! let bytes = encoder.into_bytes();
//!
//! let mut decoder = Decoder::new(&bytes);
//! assert_eq!(decoder.scalar(TdsType::I32).unwrap(), Value::I32(-42));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod timestamp;
mod types;
mod value;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, CodecResult};
pub use timestamp::Timestamp;
pub use types::TdsType;
pub use value::Value;
