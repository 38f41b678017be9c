//! Incremental segment emission.
//!
//! `write()` drains every dirty entity and pending data segment in the
//! model into appended segments, leaving the tree fully clean. Each
//! segment is written in two passes: the lead-in's total-size field and
//! any unknown element counts are reserved as zeroes, then patched in
//! place once the providers have been drained.

use std::sync::Arc;

use tdms_codec::{Encoder, TdsType, Value};
use tdms_storage::StorageBackend;

use crate::error::{CoreError, CoreResult};
use crate::model::TdmsFile;
use crate::reader::TdmsReader;
use crate::segment::{
    InterleavedShared, LeadIn, ReadSegment, Toc, WriteSegment, FORMAT_VERSION,
    RAW_INDEX_MATCHES_PREVIOUS, RAW_INDEX_NO_DATA,
};

/// Raw-data bytes are appended in chunks of roughly this size, so a
/// streaming source of any length never has to fit in memory.
const CHUNK_SIZE: usize = 64 * 1024;

/// Byte offset of the 8-byte total-size field within a lead-in.
const SEGMENT_OFFSET_FIELD: u64 = 12;

/// Appends segments for an object model onto a storage backend.
#[derive(Debug)]
pub struct TdmsWriter<B: StorageBackend> {
    backend: B,
    file: TdmsFile,
}

/// What one segment emission will cover.
enum Pass {
    /// Dirty entities only, no raw data.
    MetadataOnly,
    /// One single-channel pending segment per listed channel.
    Single(Vec<(usize, usize)>),
    /// One interleaved group of pending segments, in channel-index order.
    Interleaved(Vec<(usize, usize)>),
}

/// How one data-carrying channel appears in the metadata area.
struct DataPlan {
    group: usize,
    channel: usize,
    ty: TdsType,
    /// Matches-previous layout reuse; carries the element count the
    /// drain must reproduce.
    reuse: Option<u64>,
    /// Absolute position of the count field to patch, when not reusing.
    count_patch: Option<u64>,
    /// Absolute position of the string blob-length field to patch.
    blob_patch: Option<u64>,
}

impl<B: StorageBackend> TdmsWriter<B> {
    /// Creates a writer over a backend, starting from an empty model.
    ///
    /// New segments are appended after any existing content; use
    /// [`TdmsReader::open`] first if that content should be part of the
    /// model.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            file: TdmsFile::new(),
        }
    }

    pub(crate) fn from_parts(backend: B, file: TdmsFile) -> Self {
        Self { backend, file }
    }

    /// The object model.
    #[must_use]
    pub fn file(&self) -> &TdmsFile {
        &self.file
    }

    /// The object model, for staging changes.
    pub fn file_mut(&mut self) -> &mut TdmsFile {
        &mut self.file
    }

    /// Drains every dirty entity and pending data segment into appended
    /// segments, returning how many segments were written.
    ///
    /// Idempotent: calling it again on a clean tree appends nothing and
    /// returns zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] if a provider yields a value
    /// whose type does not match its channel, or a storage error from
    /// the appends and patches.
    pub fn write(&mut self) -> CoreResult<u64> {
        let mut emitted = 0u64;
        while !self.file.is_fully_clean() {
            self.emit_segment()?;
            emitted += 1;
        }
        if emitted > 0 {
            self.backend.flush()?;
        }
        Ok(emitted)
    }

    /// Converts into a reader over the same model and backend.
    ///
    /// No rescan happens; the read segments registered during writes are
    /// already in the model.
    #[must_use]
    pub fn into_reader(self) -> TdmsReader<B> {
        TdmsReader::from_parts(self.backend, self.file)
    }

    /// Consumes the writer, returning the backing storage.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Emits exactly one segment covering the next unit of dirty state.
    fn emit_segment(&mut self) -> CoreResult<()> {
        let pass = self.select_pass()?;

        let mut toc = Toc::METADATA.with(Toc::NEW_OBJECT_LIST);
        let data_channels: &[(usize, usize)] = match &pass {
            Pass::MetadataOnly => &[],
            Pass::Single(channels) => {
                toc = toc.with(Toc::RAW_DATA);
                channels
            }
            Pass::Interleaved(channels) => {
                toc = toc.with(Toc::RAW_DATA).with(Toc::INTERLEAVED);
                channels
            }
        };

        let (metadata, mut plans) = self.encode_metadata(data_channels)?;

        let lead_in = LeadIn {
            toc,
            version: FORMAT_VERSION,
            // Patched once the providers are drained
            segment_offset: 0,
            data_offset: metadata.len() as u64,
        };
        let lead_in_position = self.backend.append(&lead_in.encode())?;
        let metadata_position = self.backend.append(&metadata)?;
        let data_start = metadata_position + metadata.len() as u64;

        // Patch positions were recorded relative to the metadata buffer
        for plan in &mut plans {
            if let Some(patch) = &mut plan.count_patch {
                *patch += metadata_position;
            }
            if let Some(patch) = &mut plan.blob_patch {
                *patch += metadata_position;
            }
        }

        let raw_len = match &pass {
            Pass::MetadataOnly => 0,
            Pass::Single(_) => self.drain_singles(&plans, data_start)?,
            Pass::Interleaved(_) => self.drain_interleaved(&plans, data_start)?,
        };

        let segment_offset = metadata.len() as u64 + raw_len;
        self.backend.write_at(
            lead_in_position + SEGMENT_OFFSET_FIELD,
            &segment_offset.to_le_bytes(),
        )?;

        self.mark_clean();
        Ok(())
    }

    /// Decides what the next segment covers.
    ///
    /// Pending segments drain strictly in attach order per channel. An
    /// interleaved pending at the head of any channel claims a whole
    /// segment for its participant set; single pendings at other
    /// channels wait for a later pass.
    fn select_pass(&self) -> CoreResult<Pass> {
        type Shared = Arc<parking_lot::Mutex<InterleavedShared>>;

        let mut singles = Vec::new();
        let mut sets: Vec<(Shared, Vec<(usize, (usize, usize))>)> = Vec::new();

        for (g, group) in self.file.groups().iter().enumerate() {
            for (c, channel) in group.channels().iter().enumerate() {
                let Some(pending) = channel.first_pending() else {
                    continue;
                };
                match pending {
                    WriteSegment::Single { .. } => singles.push((g, c)),
                    WriteSegment::Interleaved {
                        shared,
                        channel_index,
                    } => {
                        match sets.iter_mut().find(|(s, _)| Arc::ptr_eq(s, shared)) {
                            Some((_, members)) => members.push((*channel_index, (g, c))),
                            None => sets.push((shared.clone(), vec![(*channel_index, (g, c))])),
                        }
                    }
                }
            }
        }

        // Several row sources can be pending at once; the first set with
        // every participant at its channel head claims this segment.
        let had_sets = !sets.is_empty();
        for (shared, mut members) in sets {
            let expected = shared.lock().types().len();
            members.sort_by_key(|(index, _)| *index);
            let indices: Vec<usize> = members.iter().map(|(index, _)| *index).collect();
            if indices == (0..expected).collect::<Vec<_>>() {
                return Ok(Pass::Interleaved(
                    members.into_iter().map(|(_, at)| at).collect(),
                ));
            }
        }
        // Incomplete sets wait for earlier singles on their participants
        // to drain first, advancing those channel heads
        if !singles.is_empty() {
            return Ok(Pass::Single(singles));
        }
        if had_sets {
            return Err(CoreError::invalid_state(
                "interleaved participants are not all ready to drain",
            ));
        }
        Ok(Pass::MetadataOnly)
    }

    /// Encodes the metadata area: object count, then per object its
    /// path, raw-data index, and property list.
    ///
    /// Dirty entities are listed with their full property bags; channels
    /// carrying data in this segment are listed in drain order, which
    /// fixes the raw-data layout order.
    fn encode_metadata(
        &self,
        data_channels: &[(usize, usize)],
    ) -> CoreResult<(Vec<u8>, Vec<DataPlan>)> {
        let mut encoder = Encoder::new();
        let mut plans = Vec::with_capacity(data_channels.len());
        let mut count = 0u32;

        // Object count gets fixed up at the end
        encoder.put_u32(0);

        if self.file.is_modified() {
            encode_object_header(&mut encoder, self.file.path(), RAW_INDEX_NO_DATA);
            encode_properties(&mut encoder, self.file.properties().iter());
            count += 1;
        }
        for group in self.file.groups() {
            if group.is_modified() {
                encode_object_header(&mut encoder, group.path(), RAW_INDEX_NO_DATA);
                encode_properties(&mut encoder, group.properties().iter());
                count += 1;
            }
        }

        for &(g, c) in data_channels {
            let channel = &self.file.groups()[g].channels()[c];
            let pending = channel.first_pending().ok_or_else(|| {
                CoreError::invalid_state(format!(
                    "channel '{}' has nothing pending",
                    channel.path()
                ))
            })?;
            let ty = channel.data_type().ok_or_else(|| {
                CoreError::invalid_state(format!("channel '{}' has no data type", channel.path()))
            })?;

            encoder.put_string(channel.path());

            let known = pending.known_len();
            let reusable = !pending.is_interleaved()
                && ty != TdsType::String
                && known.is_some()
                && channel.last_written_len() == known;

            let mut plan = DataPlan {
                group: g,
                channel: c,
                ty,
                reuse: None,
                count_patch: None,
                blob_patch: None,
            };
            if reusable {
                encoder.put_u32(RAW_INDEX_MATCHES_PREVIOUS);
                plan.reuse = known;
            } else {
                // Raw index value is the header length including itself
                encoder.put_u32(if ty == TdsType::String { 28 } else { 20 });
                encoder.put_u32(ty.magic());
                encoder.put_u32(1);
                plan.count_patch = Some(encoder.len() as u64);
                encoder.put_u64(0);
                if ty == TdsType::String {
                    plan.blob_patch = Some(encoder.len() as u64);
                    encoder.put_u64(0);
                }
            }

            // Mentioned objects always carry their full property bag
            encode_properties(&mut encoder, channel.properties().iter());
            plans.push(plan);
            count += 1;
        }

        // Dirty channels with no data in this segment still get their
        // properties out
        for (g, group) in self.file.groups().iter().enumerate() {
            for (c, channel) in group.channels().iter().enumerate() {
                if channel.is_modified() && !data_channels.contains(&(g, c)) {
                    encode_object_header(&mut encoder, channel.path(), RAW_INDEX_NO_DATA);
                    encode_properties(&mut encoder, channel.properties().iter());
                    count += 1;
                }
            }
        }

        let mut metadata = encoder.into_bytes();
        metadata[..4].copy_from_slice(&count.to_le_bytes());
        Ok((metadata, plans))
    }

    /// Drains one single-channel provider per plan, appending each
    /// channel's values back to back. Returns the raw-data byte length.
    fn drain_singles(&mut self, plans: &[DataPlan], data_start: u64) -> CoreResult<u64> {
        let mut cursor = data_start;
        for plan in plans {
            let channel = &mut self.file.groups_mut()[plan.group].channels_mut()[plan.channel];
            let Some(WriteSegment::Single { mut source }) = channel.take_first_pending() else {
                return Err(CoreError::invalid_state(
                    "single drain scheduled on a non-single pending segment",
                ));
            };
            let path = channel.path().to_string();

            let segment = if plan.ty == TdsType::String {
                let mut strings = Vec::new();
                while let Some(value) = source.next_value() {
                    match value {
                        Value::String(s) => strings.push(s),
                        other => {
                            return Err(type_mismatch(&path, plan.ty, other.tds_type()));
                        }
                    }
                }

                let len = strings.len() as u64;
                let (table, blob_end) = string_offset_table(strings.iter().map(String::len))
                    .ok_or_else(|| {
                        CoreError::invalid_state(format!(
                            "string data for '{path}' does not fit the 32-bit offset table"
                        ))
                    })?;
                let blob_len = u64::from(blob_end);
                self.backend.append(&table)?;
                for s in &strings {
                    self.backend.append(s.as_bytes())?;
                }

                patch_u64(&mut self.backend, plan.count_patch, len)?;
                patch_u64(&mut self.backend, plan.blob_patch, blob_len)?;

                let segment = ReadSegment::StringIndexed {
                    start: cursor,
                    len,
                    blob_len,
                };
                cursor = segment.end_position()?;
                segment
            } else {
                let mut buffer = Encoder::with_capacity(CHUNK_SIZE);
                let mut len = 0u64;
                while let Some(value) = source.next_value() {
                    if value.tds_type() != plan.ty {
                        return Err(type_mismatch(&path, plan.ty, value.tds_type()));
                    }
                    buffer.put_value(&value);
                    len += 1;
                    if buffer.len() >= CHUNK_SIZE {
                        self.backend.append(buffer.as_bytes())?;
                        buffer = Encoder::with_capacity(CHUNK_SIZE);
                    }
                }
                if !buffer.is_empty() {
                    self.backend.append(buffer.as_bytes())?;
                }

                if let Some(expected) = plan.reuse {
                    if len != expected {
                        return Err(CoreError::invalid_state(format!(
                            "provider for '{path}' produced {len} values, layout reuse \
                             requires exactly {expected}"
                        )));
                    }
                }
                patch_u64(&mut self.backend, plan.count_patch, len)?;

                let segment = ReadSegment::Contiguous {
                    start: cursor,
                    ty: plan.ty,
                    len,
                };
                cursor = segment.end_position()?;
                segment
            };

            let channel = &mut self.file.groups_mut()[plan.group].channels_mut()[plan.channel];
            channel.set_last_written_len(segment.len());
            channel.register_read_segment(segment);
        }
        Ok(cursor - data_start)
    }

    /// Drains one shared row source for a set of interleaved channels,
    /// appending row-major data. Returns the raw-data byte length.
    fn drain_interleaved(&mut self, plans: &[DataPlan], data_start: u64) -> CoreResult<u64> {
        let mut shared = None;
        for plan in plans {
            let channel = &mut self.file.groups_mut()[plan.group].channels_mut()[plan.channel];
            match channel.take_first_pending() {
                Some(WriteSegment::Interleaved {
                    shared: s,
                    channel_index,
                }) => {
                    if channel_index == 0 {
                        shared = Some(s);
                    }
                }
                _ => {
                    return Err(CoreError::invalid_state(
                        "interleaved drain scheduled on a non-interleaved pending segment",
                    ));
                }
            }
        }
        let shared = shared.ok_or_else(|| {
            CoreError::invalid_state("interleaved drain has no draining channel")
        })?;
        let mut shared = shared.lock();

        let types: Vec<TdsType> = shared.types().to_vec();
        let row_size: u64 = types
            .iter()
            .map(|ty| ty.fixed_size().unwrap_or(0) as u64)
            .sum();

        let mut buffer = Encoder::with_capacity(CHUNK_SIZE);
        let mut rows = 0u64;
        while let Some(row) = shared.next_row() {
            if row.len() != types.len() {
                return Err(CoreError::invalid_state(format!(
                    "interleaved row carries {} values for {} channels",
                    row.len(),
                    types.len()
                )));
            }
            for (value, ty) in row.iter().zip(&types) {
                if value.tds_type() != *ty {
                    return Err(CoreError::invalid_state(format!(
                        "interleaved row value of type {:?} in a {ty:?} column",
                        value.tds_type()
                    )));
                }
                buffer.put_value(value);
            }
            rows += 1;
            if buffer.len() >= CHUNK_SIZE {
                self.backend.append(buffer.as_bytes())?;
                buffer = Encoder::with_capacity(CHUNK_SIZE);
            }
        }
        if !buffer.is_empty() {
            self.backend.append(buffer.as_bytes())?;
        }
        shared.record_drained(rows);
        drop(shared);

        let mut column_offset = 0u64;
        for plan in plans {
            patch_u64(&mut self.backend, plan.count_patch, rows)?;
            let channel = &mut self.file.groups_mut()[plan.group].channels_mut()[plan.channel];
            channel.set_last_written_len(rows);
            channel.register_read_segment(ReadSegment::Interleaved {
                block_start: data_start,
                row_size,
                column_offset,
                ty: plan.ty,
                rows,
            });
            column_offset += plan.ty.fixed_size().unwrap_or(0) as u64;
        }

        Ok(row_size * rows)
    }

    /// Clears the modified flags of everything the emitted segment
    /// mentioned. Dirty entities are always mentioned, so this is the
    /// whole tree.
    fn mark_clean(&mut self) {
        self.file.mark_clean();
        for group in self.file.groups_mut() {
            group.mark_clean();
            for channel in group.channels_mut() {
                channel.mark_clean();
            }
        }
    }
}

fn encode_object_header(encoder: &mut Encoder, path: &str, raw_index: u32) {
    encoder.put_string(path);
    encoder.put_u32(raw_index);
}

fn encode_properties<'a>(
    encoder: &mut Encoder,
    properties: impl Iterator<Item = (&'a str, &'a Value)>,
) {
    let mut body = Encoder::new();
    let mut count = 0u32;
    for (name, value) in properties {
        body.put_string(name);
        body.put_u32(value.tds_type().magic());
        body.put_value(value);
        count += 1;
    }
    encoder.put_u32(count);
    encoder.put_bytes(body.as_bytes());
}

/// Builds the cumulative end-offset table for a string segment.
///
/// Returns `None` when the running total does not fit the 32-bit
/// offsets the table stores.
fn string_offset_table(lens: impl Iterator<Item = usize>) -> Option<(Vec<u8>, u32)> {
    let mut table = Encoder::new();
    let mut end = 0u32;
    for len in lens {
        end = end.checked_add(u32::try_from(len).ok()?)?;
        table.put_u32(end);
    }
    Some((table.into_bytes(), end))
}

fn patch_u64<B: StorageBackend>(
    backend: &mut B,
    position: Option<u64>,
    value: u64,
) -> CoreResult<()> {
    if let Some(position) = position {
        backend.write_at(position, &value.to_le_bytes())?;
    }
    Ok(())
}

fn type_mismatch(path: &str, expected: TdsType, got: TdsType) -> CoreError {
    CoreError::invalid_state(format!(
        "provider for '{path}' produced a {got:?} value on a {expected:?} channel"
    ))
}
