//! TDMS timestamps.

use std::fmt;

/// Seconds between 1904-01-01T00:00:00Z (the TDMS epoch) and
/// 1970-01-01T00:00:00Z (the Unix epoch).
pub(crate) const EPOCH_OFFSET_1970: i64 = 2_082_844_800;

/// A TDMS timestamp.
///
/// On disk a timestamp is 16 bytes: a `u64` of 2^-64 second fractions
/// followed by an `i64` of whole seconds since 1904-01-01T00:00:00Z.
/// The fraction field is carried through decode and encode unchanged,
/// so timestamps round-trip bit-exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds since the 1904 epoch.
    pub seconds: i64,
    /// Sub-second fractions in units of 2^-64 seconds.
    pub fractions: u64,
}

impl Timestamp {
    /// Creates a timestamp from raw wire fields.
    #[must_use]
    pub const fn new(seconds: i64, fractions: u64) -> Self {
        Self { seconds, fractions }
    }

    /// Creates a timestamp from whole seconds since the Unix epoch.
    ///
    /// The fraction field is zero.
    #[must_use]
    pub const fn from_unix_seconds(unix_seconds: i64) -> Self {
        Self {
            seconds: unix_seconds + EPOCH_OFFSET_1970,
            fractions: 0,
        }
    }

    /// Returns the whole seconds since the Unix epoch.
    #[must_use]
    pub const fn to_unix_seconds(self) -> i64 {
        self.seconds - EPOCH_OFFSET_1970
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1904+{}s.{:020}", self.seconds, self.fractions)
    }
}
