//! Segment scan and lazy read access.
//!
//! Opening a file walks the segment chain once, parsing only lead-ins
//! and metadata areas. Raw data is never touched during the scan; each
//! channel accumulates [`ReadSegment`] views and every element access is
//! a positioned read against the backing storage.

use std::collections::HashMap;

use tdms_codec::{Decoder, TdsType, Value};
use tdms_storage::StorageBackend;
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::model::TdmsFile;
use crate::segment::{
    LeadIn, ReadSegment, Toc, FORMAT_VERSION, LEAD_IN_SIZE, RAW_INDEX_MATCHES_PREVIOUS,
    RAW_INDEX_NO_DATA,
};
use crate::writer::TdmsWriter;

/// A scanned TDMS file with lazy access to channel data.
#[derive(Debug)]
pub struct TdmsReader<B: StorageBackend> {
    backend: B,
    file: TdmsFile,
}

/// The last declared raw-data layout of one object path.
#[derive(Debug, Clone, Copy)]
struct Layout {
    ty: TdsType,
    len: u64,
}

/// Scan state carried across segments.
#[derive(Debug, Default)]
struct ScanState {
    /// Paths of objects currently carrying raw data, in layout order.
    active: Vec<String>,
    /// Last declared layout per object path.
    layouts: HashMap<String, Layout>,
}

impl<B: StorageBackend> TdmsReader<B> {
    /// Opens a file by scanning its segment chain.
    ///
    /// Parses every lead-in and metadata area, builds the object model,
    /// and registers lazy read segments. No raw data is read.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad segment tag, unparseable metadata, an
    /// unknown data type magic in a raw-data header, or an unsupported
    /// encoding (big-endian or DAQmx data).
    pub fn open(backend: B) -> CoreResult<Self> {
        let mut file = TdmsFile::new();
        let mut state = ScanState::default();

        let size = backend.size()?;
        let mut position = 0u64;
        while position < size {
            if size - position < LEAD_IN_SIZE {
                return Err(CoreError::malformed(format!(
                    "{} trailing bytes cannot hold a lead-in",
                    size - position
                )));
            }
            position = scan_segment(&backend, &mut file, &mut state, position)?;
        }

        mark_tree_clean(&mut file);
        Ok(Self { backend, file })
    }

    /// Wraps an already-built model without rescanning.
    pub(crate) fn from_parts(backend: B, file: TdmsFile) -> Self {
        Self { backend, file }
    }

    /// The object model.
    #[must_use]
    pub fn file(&self) -> &TdmsFile {
        &self.file
    }

    /// Element `index` of the named channel.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] for an unknown channel or an
    /// out-of-range index, or a storage error from the positioned read.
    pub fn value(&self, group: &str, channel: &str, index: u64) -> CoreResult<Value> {
        let segments = self.channel_segments(group, channel)?;
        let mut remaining = index;
        for segment in segments {
            if remaining < segment.len() {
                return segment.value_at(&self.backend, remaining);
            }
            remaining -= segment.len();
        }
        Err(CoreError::invalid_state(format!(
            "element index {index} out of range for channel '{channel}'"
        )))
    }

    /// Total element count of the named channel across all segments.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] for an unknown channel.
    pub fn channel_len(&self, group: &str, channel: &str) -> CoreResult<u64> {
        Ok(self
            .channel_segments(group, channel)?
            .iter()
            .map(ReadSegment::len)
            .sum())
    }

    /// Iterates the named channel's elements across all segments, in
    /// file order.
    ///
    /// The iterator borrows the reader, so the backing storage cannot be
    /// closed while iteration is in progress. Each element is decoded on
    /// demand; errors surface as iterator items.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] for an unknown channel.
    pub fn channel_values(&self, group: &str, channel: &str) -> CoreResult<ChannelValues<'_>> {
        let segments = self.channel_segments(group, channel)?;
        Ok(ChannelValues {
            backend: &self.backend,
            segments,
            segment: 0,
            index: 0,
        })
    }

    /// Converts into a writer positioned to append further segments.
    ///
    /// The scanned model carries over, so subsequent writes can reuse
    /// previous channel layouts.
    #[must_use]
    pub fn into_writer(self) -> TdmsWriter<B> {
        TdmsWriter::from_parts(self.backend, self.file)
    }

    /// Consumes the reader, returning the backing storage.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn channel_segments(&self, group: &str, channel: &str) -> CoreResult<&[ReadSegment]> {
        let channel = self
            .file
            .find_group(group)
            .and_then(|g| g.find_channel(channel))
            .ok_or_else(|| {
                CoreError::invalid_state(format!("no channel '{channel}' in group '{group}'"))
            })?;
        Ok(channel.read_segments())
    }
}

/// Lazy element iterator over one channel's segments.
pub struct ChannelValues<'a> {
    backend: &'a dyn StorageBackend,
    segments: &'a [ReadSegment],
    segment: usize,
    index: u64,
}

impl Iterator for ChannelValues<'_> {
    type Item = CoreResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let segment = self.segments.get(self.segment)?;
            if self.index < segment.len() {
                let result = segment.value_at(self.backend, self.index);
                self.index += 1;
                return Some(result);
            }
            self.segment += 1;
            self.index = 0;
        }
    }
}

/// Scans one segment starting at `position`; returns the position of the
/// next segment.
fn scan_segment(
    backend: &dyn StorageBackend,
    file: &mut TdmsFile,
    state: &mut ScanState,
    position: u64,
) -> CoreResult<u64> {
    let lead_in_bytes = backend.read_at(position, LEAD_IN_SIZE as usize)?;
    let lead_in = LeadIn::decode(&lead_in_bytes)?;
    if lead_in.version != FORMAT_VERSION {
        warn!(
            version = lead_in.version,
            expected = FORMAT_VERSION,
            "segment declares an unexpected format version"
        );
    }

    let metadata_start = position + LEAD_IN_SIZE;
    let data_start = metadata_start
        .checked_add(lead_in.data_offset)
        .ok_or_else(|| {
            CoreError::malformed("lead-in metadata length puts raw data past u64::MAX")
        })?;
    // Checked addition also rules out a wrapped next-segment position
    // that would send the scan backwards; metadata_start is strictly
    // past `position`, so `next` always advances.
    let next = metadata_start
        .checked_add(lead_in.segment_offset)
        .ok_or_else(|| {
            CoreError::malformed("lead-in segment length puts the next segment past u64::MAX")
        })?;

    // Blob lengths are only valid for the segment that declares them, so
    // they live outside the persistent layouts.
    let mut blob_lens: HashMap<String, u64> = HashMap::new();
    let mut mentioned: Vec<String> = Vec::new();
    let mut dropped: Vec<String> = Vec::new();

    if lead_in.toc.contains(Toc::METADATA) {
        let metadata = backend.read_at(metadata_start, lead_in.data_offset as usize)?;
        let mut decoder = Decoder::new(&metadata);

        let object_count = decoder.u32()?;
        for _ in 0..object_count {
            let path = decoder.string()?;
            // A mention alone puts the entity in the model, even with no
            // properties and no data
            touch_path(file, &path)?;
            let raw_index = decoder.u32()?;

            match raw_index {
                RAW_INDEX_NO_DATA => dropped.push(path.clone()),
                RAW_INDEX_MATCHES_PREVIOUS => {
                    let layout = state.layouts.get(&path).copied().ok_or_else(|| {
                        CoreError::malformed(format!(
                            "'{path}' reuses a previous layout but has none"
                        ))
                    })?;
                    if layout.ty == TdsType::String {
                        return Err(CoreError::malformed(format!(
                            "string channel '{path}' cannot reuse a previous layout"
                        )));
                    }
                    mentioned.push(path.clone());
                }
                _ => {
                    let layout = decode_raw_header(&mut decoder, &path, &mut blob_lens)?;
                    state.layouts.insert(path.clone(), layout);
                    mentioned.push(path.clone());
                }
            }

            apply_properties(&mut decoder, file, &path)?;
        }
    }

    // A new object list replaces the active set; otherwise the mentioned
    // carriers amend it and explicit no-data entries drop out.
    if lead_in.toc.contains(Toc::NEW_OBJECT_LIST) {
        state.active = mentioned;
    } else {
        for path in mentioned {
            if !state.active.contains(&path) {
                state.active.push(path);
            }
        }
        state.active.retain(|path| !dropped.contains(path));
    }

    if lead_in.toc.contains(Toc::RAW_DATA) {
        register_data(
            file,
            state,
            &blob_lens,
            data_start,
            lead_in.toc.contains(Toc::INTERLEAVED),
        )?;
    }

    Ok(next)
}

/// Decodes a raw-data header: type magic, dimension, element count, and
/// for strings the total blob length.
fn decode_raw_header(
    decoder: &mut Decoder<'_>,
    path: &str,
    blob_lens: &mut HashMap<String, u64>,
) -> CoreResult<Layout> {
    let magic = decoder.u32()?;
    let ty = TdsType::from_magic(magic).ok_or(CoreError::UnknownType { magic })?;
    if !ty.is_supported() {
        return Err(CoreError::unsupported(format!(
            "raw data of type {ty:?} on '{path}'"
        )));
    }
    // Zero-width elements would let any count claim a zero-byte extent
    if ty.fixed_size() == Some(0) {
        return Err(CoreError::malformed(format!(
            "zero-width raw data declared on '{path}'"
        )));
    }

    let dimension = decoder.u32()?;
    if dimension != 1 {
        warn!(path, dimension, "raw-data header declares a dimension other than 1");
    }

    let len = decoder.u64()?;
    if ty == TdsType::String {
        let blob_len = decoder.u64()?;
        blob_lens.insert(path.to_string(), blob_len);
    }
    Ok(Layout { ty, len })
}

/// Decodes an object's property list and applies it to the model.
fn apply_properties(
    decoder: &mut Decoder<'_>,
    file: &mut TdmsFile,
    path: &str,
) -> CoreResult<()> {
    let count = decoder.u32()?;
    for _ in 0..count {
        let name = decoder.string()?;
        let magic = decoder.u32()?;
        let ty = TdsType::from_magic(magic).ok_or(CoreError::UnknownType { magic })?;

        let value = if ty.is_supported() {
            decoder.scalar(ty)?
        } else if let Some(size) = ty.fixed_size() {
            // Recognized but undecodable; its known size lets the scan
            // continue past it.
            warn!(path, name = name.as_str(), ?ty, "skipping property of unsupported type");
            decoder.skip(size)?;
            Value::Void
        } else {
            return Err(CoreError::unsupported(format!(
                "property '{name}' of type {ty:?} on '{path}'"
            )));
        };

        set_property_at(file, path, name, value)?;
    }
    Ok(())
}

/// Registers read segments for every active object, walking the raw-data
/// area without reading it.
fn register_data(
    file: &mut TdmsFile,
    state: &mut ScanState,
    blob_lens: &HashMap<String, u64>,
    data_start: u64,
    interleaved: bool,
) -> CoreResult<()> {
    let mut entries = Vec::with_capacity(state.active.len());
    for path in &state.active {
        let layout = state.layouts.get(path).copied().ok_or_else(|| {
            CoreError::malformed(format!("active object '{path}' has no layout"))
        })?;
        entries.push((path.clone(), layout));
    }

    if interleaved {
        let mut row_size = 0u64;
        for (path, layout) in &entries {
            let width = layout.ty.fixed_size().ok_or_else(|| {
                CoreError::malformed(format!(
                    "variable-width channel '{path}' in an interleaved segment"
                ))
            })?;
            row_size += width as u64;
        }

        let rows = entries.iter().map(|(_, l)| l.len).min().unwrap_or(0);
        if entries.iter().any(|(_, l)| l.len != rows) {
            warn!(rows, "interleaved channels disagree on row count, using the smallest");
        }
        row_size
            .checked_mul(rows)
            .and_then(|bytes| data_start.checked_add(bytes))
            .ok_or_else(|| {
                CoreError::malformed("declared row count puts the block extent past u64::MAX")
            })?;

        let mut column_offset = 0u64;
        for (path, layout) in &entries {
            let segment = ReadSegment::Interleaved {
                block_start: data_start,
                row_size,
                column_offset,
                ty: layout.ty,
                rows,
            };
            register_segment_at(file, path, segment)?;
            column_offset += layout.ty.fixed_size().unwrap_or(0) as u64;
        }
    } else {
        let mut cursor = data_start;
        for (path, layout) in &entries {
            let segment = if layout.ty == TdsType::String {
                let blob_len = blob_lens.get(path).copied().ok_or_else(|| {
                    CoreError::malformed(format!(
                        "string channel '{path}' carries data without a blob length"
                    ))
                })?;
                ReadSegment::StringIndexed {
                    start: cursor,
                    len: layout.len,
                    blob_len,
                }
            } else {
                ReadSegment::Contiguous {
                    start: cursor,
                    ty: layout.ty,
                    len: layout.len,
                }
            };
            cursor = segment.end_position()?;
            register_segment_at(file, path, segment)?;
        }
    }

    Ok(())
}

/// The object kind a path resolves to.
enum PathTarget {
    File,
    Group(String),
    Channel(String, String),
}

/// Parses `/`, `/'group'`, or `/'group'/'channel'`.
fn parse_path(path: &str) -> CoreResult<PathTarget> {
    if path == "/" {
        return Ok(PathTarget::File);
    }
    let trimmed = path.strip_prefix('/').ok_or_else(|| {
        CoreError::malformed(format!("object path '{path}' does not start with '/'"))
    })?;
    let parts: Vec<&str> = trimmed.split('/').map(|p| p.trim_matches('\'')).collect();
    match parts.as_slice() {
        [group] => Ok(PathTarget::Group((*group).to_string())),
        [group, channel] => Ok(PathTarget::Channel(
            (*group).to_string(),
            (*channel).to_string(),
        )),
        _ => Err(CoreError::malformed(format!(
            "object path '{path}' has more than two components"
        ))),
    }
}

fn touch_path(file: &mut TdmsFile, path: &str) -> CoreResult<()> {
    match parse_path(path)? {
        PathTarget::File => {}
        PathTarget::Group(group) => {
            file.group(&group);
        }
        PathTarget::Channel(group, channel) => {
            file.group(&group).channel(&channel);
        }
    }
    Ok(())
}

fn set_property_at(
    file: &mut TdmsFile,
    path: &str,
    name: String,
    value: Value,
) -> CoreResult<()> {
    match parse_path(path)? {
        PathTarget::File => file.set_property(name, value),
        PathTarget::Group(group) => file.group(&group).set_property(name, value),
        PathTarget::Channel(group, channel) => file
            .group(&group)
            .channel(&channel)
            .set_property(name, value),
    }
    Ok(())
}

fn register_segment_at(file: &mut TdmsFile, path: &str, segment: ReadSegment) -> CoreResult<()> {
    match parse_path(path)? {
        PathTarget::Channel(group, channel) => {
            file.group(&group)
                .channel(&channel)
                .register_read_segment(segment);
            Ok(())
        }
        _ => Err(CoreError::malformed(format!(
            "raw data attached to non-channel path '{path}'"
        ))),
    }
}

/// A freshly scanned tree has nothing to write back.
fn mark_tree_clean(file: &mut TdmsFile) {
    file.mark_clean();
    for group in file.groups_mut() {
        group.mark_clean();
        for channel in group.channels_mut() {
            channel.mark_clean();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdms_codec::Encoder;
    use tdms_storage::InMemoryBackend;

    /// Hand-assembles a single data segment for one i32 channel.
    fn one_channel_segment(values: &[i32]) -> Vec<u8> {
        let mut metadata = Encoder::new();
        metadata.put_u32(2);
        metadata.put_string("/'g'");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(0);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(20);
        metadata.put_u32(TdsType::I32.magic());
        metadata.put_u32(1);
        metadata.put_u64(values.len() as u64);
        metadata.put_u32(0);
        let metadata = metadata.into_bytes();

        let mut data = Encoder::new();
        for v in values {
            data.put_value(&Value::I32(*v));
        }
        let data = data.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA
                .with(Toc::NEW_OBJECT_LIST)
                .with(Toc::RAW_DATA),
            version: FORMAT_VERSION,
            segment_offset: (metadata.len() + data.len()) as u64,
            data_offset: metadata.len() as u64,
        };

        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);
        bytes.extend_from_slice(&data);
        bytes
    }

    #[test]
    fn scan_registers_lazy_segments() {
        let backend = InMemoryBackend::with_data(one_channel_segment(&[5, -7, 11]));
        let reader = TdmsReader::open(backend).unwrap();

        assert_eq!(reader.channel_len("g", "c").unwrap(), 3);
        assert_eq!(reader.value("g", "c", 0).unwrap(), Value::I32(5));
        assert_eq!(reader.value("g", "c", 1).unwrap(), Value::I32(-7));
        assert_eq!(reader.value("g", "c", 2).unwrap(), Value::I32(11));
        assert!(matches!(
            reader.value("g", "c", 3),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn scanned_tree_is_clean() {
        let backend = InMemoryBackend::with_data(one_channel_segment(&[1]));
        let reader = TdmsReader::open(backend).unwrap();
        assert!(reader.file().is_fully_clean());
    }

    #[test]
    fn matches_previous_appends_a_segment() {
        let mut bytes = one_channel_segment(&[1, 2]);

        // Second segment: same channel, raw index 0, two more values
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(RAW_INDEX_MATCHES_PREVIOUS);
        metadata.put_u32(0);
        let metadata = metadata.into_bytes();

        let mut data = Encoder::new();
        data.put_value(&Value::I32(3));
        data.put_value(&Value::I32(4));
        let data = data.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA
                .with(Toc::NEW_OBJECT_LIST)
                .with(Toc::RAW_DATA),
            version: FORMAT_VERSION,
            segment_offset: (metadata.len() + data.len()) as u64,
            data_offset: metadata.len() as u64,
        };
        bytes.extend_from_slice(&lead_in.encode());
        bytes.extend_from_slice(&metadata);
        bytes.extend_from_slice(&data);

        let reader = TdmsReader::open(InMemoryBackend::with_data(bytes)).unwrap();
        assert_eq!(reader.channel_len("g", "c").unwrap(), 4);
        let values: Vec<Value> = reader
            .channel_values("g", "c")
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(
            values,
            vec![Value::I32(1), Value::I32(2), Value::I32(3), Value::I32(4)]
        );
    }

    #[test]
    fn matches_previous_without_history_is_malformed() {
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(RAW_INDEX_MATCHES_PREVIOUS);
        metadata.put_u32(0);
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA
                .with(Toc::NEW_OBJECT_LIST)
                .with(Toc::RAW_DATA),
            version: FORMAT_VERSION,
            segment_offset: metadata.len() as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);

        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn properties_land_on_the_right_entity() {
        let mut metadata = Encoder::new();
        metadata.put_u32(3);
        metadata.put_string("/");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(1);
        metadata.put_string("title");
        metadata.put_u32(TdsType::String.magic());
        metadata.put_string("run 7");
        metadata.put_string("/'g'");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(1);
        metadata.put_string("count");
        metadata.put_u32(TdsType::U32.magic());
        metadata.put_u32(9);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(1);
        metadata.put_string("unit");
        metadata.put_u32(TdsType::String.magic());
        metadata.put_string("V");
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA,
            version: FORMAT_VERSION,
            segment_offset: metadata.len() as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);

        let reader = TdmsReader::open(InMemoryBackend::with_data(bytes)).unwrap();
        let file = reader.file();
        assert_eq!(
            file.properties().get("title"),
            Some(&Value::String("run 7".to_string()))
        );
        assert_eq!(
            file.find_group("g").unwrap().properties().get("count"),
            Some(&Value::U32(9))
        );
        assert_eq!(
            file.find_group("g")
                .unwrap()
                .find_channel("c")
                .unwrap()
                .properties()
                .get("unit"),
            Some(&Value::String("V".to_string()))
        );
    }

    #[test]
    fn unknown_property_magic_is_fatal() {
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(1);
        metadata.put_string("weird");
        metadata.put_u32(0xDEAD_BEEF);
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA,
            version: FORMAT_VERSION,
            segment_offset: metadata.len() as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);

        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::UnknownType { magic: 0xDEAD_BEEF })
        ));
    }

    #[test]
    fn unsupported_property_with_known_size_is_skipped() {
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/");
        metadata.put_u32(RAW_INDEX_NO_DATA);
        metadata.put_u32(2);
        metadata.put_string("exotic");
        metadata.put_u32(TdsType::ComplexF64.magic());
        metadata.put_u64(0);
        metadata.put_u64(0);
        metadata.put_string("after");
        metadata.put_u32(TdsType::I32.magic());
        metadata.put_u32(42);
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA,
            version: FORMAT_VERSION,
            segment_offset: metadata.len() as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);

        let reader = TdmsReader::open(InMemoryBackend::with_data(bytes)).unwrap();
        assert_eq!(
            reader.file().properties().get("exotic"),
            Some(&Value::Void)
        );
        assert_eq!(
            reader.file().properties().get("after"),
            Some(&Value::I32(42))
        );
    }

    #[test]
    fn unknown_raw_type_is_fatal() {
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(20);
        metadata.put_u32(0x0000_0022);
        metadata.put_u32(1);
        metadata.put_u64(4);
        metadata.put_u32(0);
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA
                .with(Toc::NEW_OBJECT_LIST)
                .with(Toc::RAW_DATA),
            version: FORMAT_VERSION,
            segment_offset: (metadata.len() + 16) as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);
        bytes.extend_from_slice(&[0u8; 16]);

        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::UnknownType { magic: 0x0000_0022 })
        ));
    }

    #[test]
    fn empty_storage_is_an_empty_file() {
        let reader = TdmsReader::open(InMemoryBackend::new()).unwrap();
        assert!(reader.file().groups().is_empty());
        assert!(reader.file().is_fully_clean());
    }

    #[test]
    fn oversized_element_count_is_malformed() {
        let mut metadata = Encoder::new();
        metadata.put_u32(1);
        metadata.put_string("/'g'/'c'");
        metadata.put_u32(20);
        metadata.put_u32(TdsType::I32.magic());
        metadata.put_u32(1);
        metadata.put_u64(u64::MAX);
        metadata.put_u32(0);
        let metadata = metadata.into_bytes();

        let lead_in = LeadIn {
            toc: Toc::METADATA
                .with(Toc::NEW_OBJECT_LIST)
                .with(Toc::RAW_DATA),
            version: FORMAT_VERSION,
            segment_offset: (metadata.len() + 4) as u64,
            data_offset: metadata.len() as u64,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&metadata);
        bytes.extend_from_slice(&[0u8; 4]);

        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn wrapping_segment_offset_is_malformed() {
        let lead_in = LeadIn {
            toc: Toc::METADATA,
            version: FORMAT_VERSION,
            segment_offset: u64::MAX,
            data_offset: 0,
        };
        let mut bytes = lead_in.encode();
        bytes.extend_from_slice(&4u32.to_le_bytes());

        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn garbage_at_segment_boundary_is_malformed() {
        let mut bytes = one_channel_segment(&[1]);
        bytes.extend_from_slice(b"not a segment tag, just junk bytes xx");
        assert!(matches!(
            TdmsReader::open(InMemoryBackend::with_data(bytes)),
            Err(CoreError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn path_parsing() {
        assert!(matches!(parse_path("/").unwrap(), PathTarget::File));
        assert!(
            matches!(parse_path("/'a'").unwrap(), PathTarget::Group(g) if g == "a")
        );
        assert!(matches!(
            parse_path("/'a'/'b'").unwrap(),
            PathTarget::Channel(g, c) if g == "a" && c == "b"
        ));
        assert!(parse_path("/'a'/'b'/'c'").is_err());
        assert!(parse_path("no-slash").is_err());
    }
}
