//! Typed values as they appear in properties and channel data.

use crate::timestamp::Timestamp;
use crate::types::TdsType;

/// A typed TDMS value.
///
/// Each variant corresponds to exactly one on-disk type, so the on-disk
/// representation of a value is always explicit - there is no width
/// inference that could silently narrow an integer. Callers pick the
/// representation when they construct the value (the `From` impls map
/// every Rust primitive to the type of the same width and sign).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Void,
    /// Boolean.
    Bool(bool),
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Single-precision float.
    F32(f32),
    /// Double-precision float.
    F64(f64),
    /// UTF-8 string.
    String(String),
    /// Timestamp.
    Timestamp(Timestamp),
}

impl Value {
    /// Returns the on-disk type of this value.
    #[must_use]
    pub const fn tds_type(&self) -> TdsType {
        match self {
            Value::Void => TdsType::Void,
            Value::Bool(_) => TdsType::Bool,
            Value::I8(_) => TdsType::I8,
            Value::I16(_) => TdsType::I16,
            Value::I32(_) => TdsType::I32,
            Value::I64(_) => TdsType::I64,
            Value::U8(_) => TdsType::U8,
            Value::U16(_) => TdsType::U16,
            Value::U32(_) => TdsType::U32,
            Value::U64(_) => TdsType::U64,
            Value::F32(_) => TdsType::F32,
            Value::F64(_) => TdsType::F64,
            Value::String(_) => TdsType::String,
            Value::Timestamp(_) => TdsType::Timestamp,
        }
    }

    /// Check if this value is void.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an `i64`, widening any signed integer variant.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(n) => Some(i64::from(*n)),
            Value::I16(n) => Some(i64::from(*n)),
            Value::I32(n) => Some(i64::from(*n)),
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a `u64`, widening any unsigned integer variant.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(n) => Some(u64::from(*n)),
            Value::U16(n) => Some(u64::from(*n)),
            Value::U32(n) => Some(u64::from(*n)),
            Value::U64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as an `f64`, widening `F32`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(x) => Some(f64::from(*x)),
            Value::F64(x) => Some(*x),
            _ => None,
        }
    }

    /// Get this value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a timestamp, if it is one.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i8> for Value {
    fn from(n: i8) -> Self {
        Value::I8(n)
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::I16(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::U8(n)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::U16(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::U32(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::U64(n)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::F32(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::F64(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Void
    }
}
