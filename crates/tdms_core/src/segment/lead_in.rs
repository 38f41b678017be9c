//! Segment lead-in and table-of-contents bitmask.

use crate::error::{CoreError, CoreResult};
use tdms_codec::{Decoder, Encoder};

/// The 4-byte ASCII tag opening every segment.
pub const SEGMENT_TAG: &[u8; 4] = b"TDSm";

/// The segment format version this engine reads and writes.
pub const FORMAT_VERSION: u32 = 4713;

/// Size of the lead-in in bytes: tag + ToC + version + two offsets.
pub const LEAD_IN_SIZE: u64 = 28;

/// Raw-data index meaning "this object carries no data in this segment".
pub const RAW_INDEX_NO_DATA: u32 = 0xFFFF_FFFF;

/// Raw-data index meaning "same layout as this channel's previous
/// segment": no new data header follows, the previous type and element
/// count apply.
pub const RAW_INDEX_MATCHES_PREVIOUS: u32 = 0;

/// Table-of-contents bitmask describing which optional parts of a
/// segment are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Toc(u32);

impl Toc {
    /// No bits set.
    pub const NONE: Self = Self(0);
    /// Segment contains object metadata.
    pub const METADATA: Self = Self(1 << 1);
    /// Segment carries a complete (new) object list.
    pub const NEW_OBJECT_LIST: Self = Self(1 << 2);
    /// Segment contains raw channel data.
    pub const RAW_DATA: Self = Self(1 << 3);
    /// Raw data is interleaved across channels.
    pub const INTERLEAVED: Self = Self(1 << 5);
    /// Numeric data is big-endian (unsupported).
    pub const BIG_ENDIAN: Self = Self(1 << 6);
    /// Segment contains DAQmx raw data (unsupported).
    pub const DAQMX_RAW: Self = Self(1 << 7);

    /// Creates a bitmask from the raw wire value.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether all bits of `flag` are set.
    #[must_use]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Returns this mask with the bits of `flag` added.
    #[must_use]
    pub const fn with(self, flag: Self) -> Self {
        Self(self.0 | flag.0)
    }
}

/// A decoded segment lead-in.
///
/// The two offsets are relative to the stream position immediately after
/// the lead-in, which is where both the metadata area and (via
/// `data_offset`) the raw-data area are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadIn {
    /// Which optional parts the segment contains.
    pub toc: Toc,
    /// Format version found in the segment.
    pub version: u32,
    /// Distance from the end of the lead-in to the end of the segment.
    pub segment_offset: u64,
    /// Distance from the end of the lead-in to the start of raw data.
    pub data_offset: u64,
}

impl LeadIn {
    /// Encodes the lead-in to its 28-byte wire form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::with_capacity(LEAD_IN_SIZE as usize);
        encoder.put_bytes(SEGMENT_TAG);
        encoder.put_u32(self.toc.bits());
        encoder.put_u32(self.version);
        encoder.put_u64(self.segment_offset);
        encoder.put_u64(self.data_offset);
        encoder.into_bytes()
    }

    /// Decodes a lead-in from its 28-byte wire form.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MalformedHeader`] if the tag is wrong or the input
    ///   is truncated
    /// - [`CoreError::UnsupportedEncoding`] if the ToC declares
    ///   big-endian or DAQmx raw data
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < LEAD_IN_SIZE as usize {
            return Err(CoreError::malformed(format!(
                "truncated lead-in: {} of {} bytes",
                bytes.len(),
                LEAD_IN_SIZE
            )));
        }
        if &bytes[..4] != SEGMENT_TAG {
            return Err(CoreError::malformed(format!(
                "bad segment tag: {:02x?}",
                &bytes[..4]
            )));
        }

        let mut decoder = Decoder::new(&bytes[4..]);
        let toc = Toc::from_bits(decoder.u32()?);
        let version = decoder.u32()?;
        let segment_offset = decoder.u64()?;
        let data_offset = decoder.u64()?;

        if toc.contains(Toc::BIG_ENDIAN) {
            return Err(CoreError::unsupported("big-endian segment data"));
        }
        if toc.contains(Toc::DAQMX_RAW) {
            return Err(CoreError::unsupported("DAQmx raw data segment"));
        }

        Ok(Self {
            toc,
            version,
            segment_offset,
            data_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_bits() {
        let toc = Toc::NONE
            .with(Toc::METADATA)
            .with(Toc::NEW_OBJECT_LIST)
            .with(Toc::RAW_DATA);
        assert_eq!(toc.bits(), 0b1110);
        assert!(toc.contains(Toc::METADATA));
        assert!(toc.contains(Toc::RAW_DATA));
        assert!(!toc.contains(Toc::INTERLEAVED));
    }

    #[test]
    fn lead_in_roundtrip() {
        let lead_in = LeadIn {
            toc: Toc::METADATA.with(Toc::NEW_OBJECT_LIST),
            version: FORMAT_VERSION,
            segment_offset: 1234,
            data_offset: 56,
        };
        let bytes = lead_in.encode();
        assert_eq!(bytes.len(), LEAD_IN_SIZE as usize);
        assert_eq!(&bytes[..4], b"TDSm");
        assert_eq!(LeadIn::decode(&bytes).unwrap(), lead_in);
    }

    #[test]
    fn bad_tag_is_malformed() {
        let mut bytes = LeadIn {
            toc: Toc::NONE,
            version: FORMAT_VERSION,
            segment_offset: 0,
            data_offset: 0,
        }
        .encode();
        bytes[0] = b'X';
        assert!(matches!(
            LeadIn::decode(&bytes),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn truncated_lead_in_is_malformed() {
        assert!(matches!(
            LeadIn::decode(b"TDSm\x00\x00"),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn big_endian_is_rejected() {
        let bytes = LeadIn {
            toc: Toc::METADATA.with(Toc::BIG_ENDIAN),
            version: FORMAT_VERSION,
            segment_offset: 0,
            data_offset: 0,
        }
        .encode();
        assert!(matches!(
            LeadIn::decode(&bytes),
            Err(CoreError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn daqmx_is_rejected() {
        let bytes = LeadIn {
            toc: Toc::METADATA.with(Toc::DAQMX_RAW),
            version: FORMAT_VERSION,
            segment_offset: 0,
            data_offset: 0,
        }
        .encode();
        assert!(matches!(
            LeadIn::decode(&bytes),
            Err(CoreError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn unknown_version_still_decodes() {
        let bytes = LeadIn {
            toc: Toc::METADATA,
            version: 4712,
            segment_offset: 0,
            data_offset: 0,
        }
        .encode();
        // Version mismatch is the reader's warning, not a decode failure
        assert_eq!(LeadIn::decode(&bytes).unwrap().version, 4712);
    }
}
