//! Little-endian wire decoder.

use crate::error::{CodecError, CodecResult};
use crate::timestamp::Timestamp;
use crate::types::TdsType;
use crate::value::Value;

/// A cursor decoder over a byte slice.
///
/// Every read is bounds-checked and advances the cursor; running off the
/// end of the slice yields [`CodecError::UnexpectedEof`] rather than a
/// panic, since segment metadata comes straight from untrusted files.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder for the given bytes.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if all bytes have been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get the remaining bytes.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// The cursor position from the start of the slice.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Advances the cursor by `len` bytes without interpreting them.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEof`] if fewer than `len` bytes
    /// remain.
    pub fn skip(&mut self, len: usize) -> CodecResult<()> {
        self.take(len).map(|_| ())
    }

    #[inline]
    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads a `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEof`] on truncated input.
    pub fn u32(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEof`] on truncated input.
    pub fn u64(&mut self) -> CodecResult<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads an `i64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEof`] on truncated input.
    pub fn i64(&mut self) -> CodecResult<i64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(buf))
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input or invalid UTF-8.
    pub fn string(&mut self) -> CodecResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(text.to_string())
    }

    /// Reads a 16-byte timestamp (fractions, then seconds).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnexpectedEof`] on truncated input.
    pub fn timestamp(&mut self) -> CodecResult<Timestamp> {
        let fractions = self.u64()?;
        let seconds = self.i64()?;
        Ok(Timestamp::new(seconds, fractions))
    }

    /// Reads one value of the given type in its on-disk representation.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input, invalid UTF-8, or a type the
    /// codec cannot decode.
    pub fn scalar(&mut self, ty: TdsType) -> CodecResult<Value> {
        match ty {
            TdsType::Void => Ok(Value::Void),
            TdsType::Bool => {
                let bytes = self.take(1)?;
                Ok(Value::Bool(bytes[0] != 0))
            }
            TdsType::I8 => {
                let bytes = self.take(1)?;
                Ok(Value::I8(bytes[0] as i8))
            }
            TdsType::I16 => {
                let bytes = self.take(2)?;
                Ok(Value::I16(i16::from_le_bytes([bytes[0], bytes[1]])))
            }
            TdsType::I32 => {
                let bytes = self.take(4)?;
                Ok(Value::I32(i32::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            TdsType::I64 => Ok(Value::I64(self.i64()?)),
            TdsType::U8 => {
                let bytes = self.take(1)?;
                Ok(Value::U8(bytes[0]))
            }
            TdsType::U16 => {
                let bytes = self.take(2)?;
                Ok(Value::U16(u16::from_le_bytes([bytes[0], bytes[1]])))
            }
            TdsType::U32 => Ok(Value::U32(self.u32()?)),
            TdsType::U64 => Ok(Value::U64(self.u64()?)),
            TdsType::F32 => {
                let bytes = self.take(4)?;
                Ok(Value::F32(f32::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            TdsType::F64 => {
                let bytes = self.take(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(Value::F64(f64::from_le_bytes(buf)))
            }
            TdsType::String => Ok(Value::String(self.string()?)),
            TdsType::Timestamp => Ok(Value::Timestamp(self.timestamp()?)),
            other => Err(CodecError::UnsupportedType { ty: other }),
        }
    }
}
