//! The fixed catalog of TDMS on-disk data types.

/// A TDMS on-disk data type.
///
/// Every value stored in a segment - property values and channel samples
/// alike - is tagged with one of these magic numbers. The catalog is
/// fixed by the wire format; several entries are recognized so files
/// containing them can be diagnosed, but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdsType {
    /// No value (0 bytes).
    Void,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Single-precision float.
    F32,
    /// Double-precision float.
    F64,
    /// Extended-precision float (recognized, not supported).
    ExtendedFloat,
    /// Single-precision float with unit (recognized, not supported).
    F32WithUnit,
    /// Double-precision float with unit (recognized, not supported).
    F64WithUnit,
    /// Extended-precision float with unit (recognized, not supported).
    ExtendedFloatWithUnit,
    /// Variable-length UTF-8 string.
    String,
    /// Boolean (1 byte).
    Bool,
    /// 16-byte timestamp on the 1904 epoch.
    Timestamp,
    /// Fixed-point number (recognized, not supported).
    FixedPoint,
    /// Single-precision complex number (recognized, not supported).
    ComplexF32,
    /// Double-precision complex number (recognized, not supported).
    ComplexF64,
    /// DAQmx raw data marker (recognized, explicitly unsupported).
    DaqmxRawData,
}

impl TdsType {
    /// Looks up a type by its on-disk magic number.
    ///
    /// A single uniform match; nothing here is performance-sensitive
    /// enough to warrant a tiered lookup.
    #[must_use]
    pub const fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            0x0000_0000 => Some(Self::Void),
            0x0000_0001 => Some(Self::I8),
            0x0000_0002 => Some(Self::I16),
            0x0000_0003 => Some(Self::I32),
            0x0000_0004 => Some(Self::I64),
            0x0000_0005 => Some(Self::U8),
            0x0000_0006 => Some(Self::U16),
            0x0000_0007 => Some(Self::U32),
            0x0000_0008 => Some(Self::U64),
            0x0000_0009 => Some(Self::F32),
            0x0000_000A => Some(Self::F64),
            0x0000_000B => Some(Self::ExtendedFloat),
            0x0000_0019 => Some(Self::F32WithUnit),
            0x0000_001A => Some(Self::F64WithUnit),
            0x0000_001B => Some(Self::ExtendedFloatWithUnit),
            0x0000_0020 => Some(Self::String),
            0x0000_0021 => Some(Self::Bool),
            0x0000_0044 => Some(Self::Timestamp),
            0x0000_004F => Some(Self::FixedPoint),
            0x0008_000C => Some(Self::ComplexF32),
            0x0010_000D => Some(Self::ComplexF64),
            0xFFFF_FFFF => Some(Self::DaqmxRawData),
            _ => None,
        }
    }

    /// Returns the on-disk magic number for this type.
    #[must_use]
    pub const fn magic(self) -> u32 {
        match self {
            Self::Void => 0x0000_0000,
            Self::I8 => 0x0000_0001,
            Self::I16 => 0x0000_0002,
            Self::I32 => 0x0000_0003,
            Self::I64 => 0x0000_0004,
            Self::U8 => 0x0000_0005,
            Self::U16 => 0x0000_0006,
            Self::U32 => 0x0000_0007,
            Self::U64 => 0x0000_0008,
            Self::F32 => 0x0000_0009,
            Self::F64 => 0x0000_000A,
            Self::ExtendedFloat => 0x0000_000B,
            Self::F32WithUnit => 0x0000_0019,
            Self::F64WithUnit => 0x0000_001A,
            Self::ExtendedFloatWithUnit => 0x0000_001B,
            Self::String => 0x0000_0020,
            Self::Bool => 0x0000_0021,
            Self::Timestamp => 0x0000_0044,
            Self::FixedPoint => 0x0000_004F,
            Self::ComplexF32 => 0x0008_000C,
            Self::ComplexF64 => 0x0010_000D,
            Self::DaqmxRawData => 0xFFFF_FFFF,
        }
    }

    /// Returns the fixed on-disk size of one value of this type in bytes.
    ///
    /// `None` for variable-length types ([`TdsType::String`]) and for
    /// types whose size the format does not define
    /// ([`TdsType::FixedPoint`], [`TdsType::DaqmxRawData`]).
    ///
    /// Unsupported types with a defined size still report it, so property
    /// values of those types can be skipped during a scan.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Void => Some(0),
            Self::I8 | Self::U8 | Self::Bool => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 | Self::F32WithUnit => Some(4),
            Self::I64 | Self::U64 | Self::F64 | Self::F64WithUnit | Self::ComplexF32 => Some(8),
            Self::ExtendedFloat | Self::ExtendedFloatWithUnit => Some(10),
            Self::Timestamp | Self::ComplexF64 => Some(16),
            Self::String | Self::FixedPoint | Self::DaqmxRawData => None,
        }
    }

    /// Whether values of this type can be decoded and encoded.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        matches!(
            self,
            Self::Void
                | Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::F32
                | Self::F64
                | Self::String
                | Self::Bool
                | Self::Timestamp
        )
    }
}
