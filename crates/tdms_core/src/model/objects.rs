//! File, group, and channel entities.

use crate::error::{CoreError, CoreResult};
use crate::model::properties::Properties;
use crate::segment::{InterleavedShared, ReadSegment, WriteSegment};
use crate::source::{RowSource, ValueSource, VecSource};
use parking_lot::Mutex;
use std::sync::Arc;
use tdms_codec::{TdsType, Value};

/// The root of the object model, with the fixed path `/`.
///
/// A file owns an insertion-ordered set of groups. Entities start out
/// modified so a freshly built tree is written in full on the first
/// `write()`.
#[derive(Debug)]
pub struct TdmsFile {
    properties: Properties,
    modified: bool,
    groups: Vec<Group>,
}

impl Default for TdmsFile {
    fn default() -> Self {
        Self::new()
    }
}

impl TdmsFile {
    /// Creates an empty file object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            properties: Properties::new(),
            modified: true,
            groups: Vec::new(),
        }
    }

    /// The file path, always `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        "/"
    }

    /// Gets or creates the group with the given name.
    ///
    /// Idempotent: an existing group is returned as-is and never
    /// reordered.
    pub fn group(&mut self, name: &str) -> &mut Group {
        if let Some(index) = self.groups.iter().position(|g| g.name == name) {
            return &mut self.groups[index];
        }
        self.groups.push(Group::new(name));
        self.groups.last_mut().expect("just pushed")
    }

    /// The groups in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    /// Sets a property, marking the file modified unless the value is
    /// structurally equal to the stored one.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if self.properties.set(name, value.into()) {
            self.modified = true;
        }
    }

    /// The file's properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Whether the file entity itself has unwritten changes.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Whether the whole tree - file, groups, channels, pending data -
    /// has been written out.
    #[must_use]
    pub fn is_fully_clean(&self) -> bool {
        !self.modified
            && self.groups.iter().all(|g| {
                !g.modified && g.channels.iter().all(|c| !c.modified && !c.has_pending())
            })
    }
}

/// A named group of channels.
#[derive(Debug)]
pub struct Group {
    name: String,
    path: String,
    properties: Properties,
    modified: bool,
    channels: Vec<Channel>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            // The file's own "/" supplies the separator
            path: format!("/'{name}'"),
            properties: Properties::new(),
            modified: true,
            channels: Vec::new(),
        }
    }

    /// The group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group path, `/'name'`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Gets or creates the channel with the given name.
    ///
    /// Idempotent: an existing channel is returned as-is and never
    /// reordered.
    pub fn channel(&mut self, name: &str) -> &mut Channel {
        if let Some(index) = self.channels.iter().position(|c| c.name == name) {
            return &mut self.channels[index];
        }
        self.channels.push(Channel::new(name, &self.path));
        self.channels.last_mut().expect("just pushed")
    }

    /// The channels in insertion order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Looks up a channel by name.
    #[must_use]
    pub fn find_channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    /// Sets a property, marking the group modified unless the value is
    /// structurally equal to the stored one.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if self.properties.set(name, value.into()) {
            self.modified = true;
        }
    }

    /// The group's properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Whether the group entity itself has unwritten changes.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    /// Attaches one interleaved row source across several channels of
    /// this group.
    ///
    /// `names` lists the participating channels in channel-index order;
    /// each row from the source must carry one value per channel in that
    /// same order. The channels must already exist and have fixed-width
    /// data types.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] if a named channel does not
    /// exist, has no data type, or has a variable-width type.
    pub fn attach_interleaved(
        &mut self,
        names: &[&str],
        source: Box<dyn RowSource>,
    ) -> CoreResult<()> {
        let mut types = Vec::with_capacity(names.len());
        for name in names {
            let channel = self
                .channels
                .iter()
                .find(|c| c.name == *name)
                .ok_or_else(|| {
                    CoreError::invalid_state(format!("no channel '{name}' in group '{}'", self.name))
                })?;
            let ty = channel.data_type.ok_or_else(|| {
                CoreError::invalid_state(format!("channel '{name}' has no data type"))
            })?;
            if ty.fixed_size().is_none() || !ty.is_supported() {
                return Err(CoreError::invalid_state(format!(
                    "channel '{name}' type {ty:?} cannot be interleaved"
                )));
            }
            types.push(ty);
        }

        let shared = Arc::new(Mutex::new(InterleavedShared::new(source, types)));
        for (index, name) in names.iter().enumerate() {
            let channel = self
                .channels
                .iter_mut()
                .find(|c| c.name == *name)
                .expect("checked above");
            channel
                .pending
                .push(WriteSegment::interleaved(shared.clone(), index));
        }
        Ok(())
    }
}

/// A named, typed sequence of measurement values.
#[derive(Debug)]
pub struct Channel {
    name: String,
    path: String,
    properties: Properties,
    modified: bool,
    data_type: Option<TdsType>,
    pending: Vec<WriteSegment>,
    read_segments: Vec<ReadSegment>,
    last_written_len: Option<u64>,
}

impl Channel {
    fn new(name: &str, group_path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: format!("{group_path}/'{name}'"),
            properties: Properties::new(),
            modified: true,
            data_type: None,
            pending: Vec::new(),
            read_segments: Vec::new(),
            last_written_len: None,
        }
    }

    /// The channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The channel path, `/'group'/'channel'`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The channel's data type, if one has been set or read.
    #[must_use]
    pub fn data_type(&self) -> Option<TdsType> {
        self.data_type
    }

    /// Sets the channel's data type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] for a type this engine cannot
    /// encode.
    pub fn set_data_type(&mut self, ty: TdsType) -> CoreResult<()> {
        if !ty.is_supported() {
            return Err(CoreError::invalid_state(format!(
                "data type {ty:?} is not supported"
            )));
        }
        if self.data_type != Some(ty) {
            self.data_type = Some(ty);
            // A type change invalidates layout reuse against earlier segments
            self.last_written_len = None;
            self.modified = true;
        }
        Ok(())
    }

    /// Attaches an array-backed pending data segment.
    ///
    /// If no data type is set yet, the first value's type is adopted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] if any value's type differs
    /// from the channel type, or if the channel has no type and `values`
    /// is empty.
    pub fn append_values(&mut self, values: Vec<Value>) -> CoreResult<()> {
        let ty = match self.data_type {
            Some(ty) => ty,
            None => {
                let first = values.first().ok_or_else(|| {
                    CoreError::invalid_state(
                        "cannot infer a data type from an empty value list",
                    )
                })?;
                let ty = first.tds_type();
                self.set_data_type(ty)?;
                ty
            }
        };
        for value in &values {
            if value.tds_type() != ty {
                return Err(CoreError::invalid_state(format!(
                    "value of type {:?} on channel of type {ty:?}",
                    value.tds_type()
                )));
            }
        }
        self.pending.push(WriteSegment::single(Box::new(
            VecSource::new(values),
        )));
        Ok(())
    }

    /// Attaches a streaming pending data segment.
    ///
    /// The channel must already have a data type; the source's values
    /// are type-checked as they are drained.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] if no data type is set.
    pub fn append_source(&mut self, source: Box<dyn ValueSource>) -> CoreResult<()> {
        if self.data_type.is_none() {
            return Err(CoreError::invalid_state(
                "set a data type before attaching a streaming source",
            ));
        }
        self.pending.push(WriteSegment::single(source));
        Ok(())
    }

    /// Sets a property, marking the channel modified unless the value is
    /// structurally equal to the stored one.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if self.properties.set(name, value.into()) {
            self.modified = true;
        }
    }

    /// The channel's properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Whether the channel entity itself has unwritten changes.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether any pending write segments are attached.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The pending write segments in attach order.
    #[must_use]
    pub fn pending_segments(&self) -> &[WriteSegment] {
        &self.pending
    }

    /// The read segments registered by the reader, in registration order.
    #[must_use]
    pub fn read_segments(&self) -> &[ReadSegment] {
        &self.read_segments
    }

    /// Total element count across all registered read segments.
    #[must_use]
    pub fn read_len(&self) -> u64 {
        self.read_segments.iter().map(ReadSegment::len).sum()
    }

    pub(crate) fn mark_clean(&mut self) {
        self.modified = false;
    }

    pub(crate) fn register_read_segment(&mut self, segment: ReadSegment) {
        self.data_type = Some(segment.data_type());
        self.read_segments.push(segment);
    }

    pub(crate) fn first_pending(&self) -> Option<&WriteSegment> {
        self.pending.first()
    }

    pub(crate) fn take_first_pending(&mut self) -> Option<WriteSegment> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub(crate) fn last_written_len(&self) -> Option<u64> {
        self.last_written_len
    }

    pub(crate) fn set_last_written_len(&mut self, len: u64) {
        self.last_written_len = Some(len);
    }
}
