//! Little-endian wire encoder.

use crate::timestamp::Timestamp;
use crate::value::Value;

/// A little-endian encoder over an owned buffer.
///
/// All multi-byte primitives are written little-endian; strings are
/// written as raw UTF-8 bytes, with the 4-byte length prefix added by
/// [`Encoder::put_string`] where the wire position calls for one
/// (property values, object paths).
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    /// Create a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume this encoder and return the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Appends raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Appends a `u32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends an `i64`.
    pub fn put_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a length-prefixed UTF-8 string.
    ///
    /// # Panics
    ///
    /// Panics if the string is longer than the 4-byte length prefix can
    /// describe; silently truncating the prefix would corrupt every byte
    /// that follows it.
    pub fn put_string(&mut self, s: &str) {
        let len = u32::try_from(s.len()).expect("string longer than a u32 length prefix");
        self.put_u32(len);
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Appends a 16-byte timestamp (fractions, then seconds).
    pub fn put_timestamp(&mut self, ts: Timestamp) {
        self.put_u64(ts.fractions);
        self.put_i64(ts.seconds);
    }

    /// Appends one value in its on-disk representation.
    ///
    /// Strings are length-prefixed, which is the shape used for property
    /// values. Channel data strings use the indexed layout instead, which
    /// the segment writer assembles from the raw bytes itself.
    pub fn put_value(&mut self, value: &Value) {
        match value {
            Value::Void => {}
            Value::Bool(b) => self.buffer.push(u8::from(*b)),
            Value::I8(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::I16(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::I32(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::I64(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::U8(n) => self.buffer.push(*n),
            Value::U16(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::U32(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::U64(n) => self.buffer.extend_from_slice(&n.to_le_bytes()),
            Value::F32(x) => self.buffer.extend_from_slice(&x.to_le_bytes()),
            Value::F64(x) => self.buffer.extend_from_slice(&x.to_le_bytes()),
            Value::String(s) => self.put_string(s),
            Value::Timestamp(ts) => self.put_timestamp(*ts),
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
