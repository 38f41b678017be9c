//! Caller-supplied value providers for the write path.
//!
//! A source is a one-shot, forward-only supply of values to persist.
//! Array-backed sources know their length up front, which lets the writer
//! emit a complete data header in one pass; streaming sources of unknown
//! length make the writer reserve the count field and patch it after the
//! drain.

use tdms_codec::Value;

/// A one-shot forward source of values for a single channel.
pub trait ValueSource: Send {
    /// Produces the next value, or `None` when exhausted.
    fn next_value(&mut self) -> Option<Value>;

    /// The total number of values this source will produce, if known
    /// before draining.
    fn known_len(&self) -> Option<u64>;
}

/// A one-shot forward source of rows for a set of interleaved channels.
///
/// Each row carries one value per participating channel, in channel-index
/// order.
pub trait RowSource: Send {
    /// Produces the next row, or `None` when exhausted.
    fn next_row(&mut self) -> Option<Vec<Value>>;

    /// The total number of rows this source will produce, if known
    /// before draining.
    fn known_len(&self) -> Option<u64>;
}

/// An array-backed value source with a known length.
pub struct VecSource {
    values: std::vec::IntoIter<Value>,
    len: u64,
}

impl VecSource {
    /// Creates a source over the given values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        let len = values.len() as u64;
        Self {
            values: values.into_iter(),
            len,
        }
    }
}

impl ValueSource for VecSource {
    fn next_value(&mut self) -> Option<Value> {
        self.values.next()
    }

    fn known_len(&self) -> Option<u64> {
        Some(self.len)
    }
}

/// A streaming value source of unknown length.
///
/// Wraps any iterator of values; the writer will patch the element count
/// into the data header after the drain completes.
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Value> + Send,
{
    /// Creates a source over the given iterator.
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> ValueSource for IterSource<I>
where
    I: Iterator<Item = Value> + Send,
{
    fn next_value(&mut self) -> Option<Value> {
        self.iter.next()
    }

    fn known_len(&self) -> Option<u64> {
        None
    }
}

/// An array-backed row source with a known length.
pub struct VecRowSource {
    rows: std::vec::IntoIter<Vec<Value>>,
    len: u64,
}

impl VecRowSource {
    /// Creates a source over the given rows.
    #[must_use]
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        let len = rows.len() as u64;
        Self {
            rows: rows.into_iter(),
            len,
        }
    }
}

impl RowSource for VecRowSource {
    fn next_row(&mut self) -> Option<Vec<Value>> {
        self.rows.next()
    }

    fn known_len(&self) -> Option<u64> {
        Some(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_drains_in_order() {
        let mut source = VecSource::new(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        assert_eq!(source.known_len(), Some(3));
        assert_eq!(source.next_value(), Some(Value::I32(1)));
        assert_eq!(source.next_value(), Some(Value::I32(2)));
        assert_eq!(source.next_value(), Some(Value::I32(3)));
        assert_eq!(source.next_value(), None);
    }

    #[test]
    fn iter_source_has_no_known_len() {
        let mut source = IterSource::new((0..4).map(Value::I32));
        assert_eq!(source.known_len(), None);
        assert_eq!(source.next_value(), Some(Value::I32(0)));
    }

    #[test]
    fn row_source_drains_rows() {
        let mut source = VecRowSource::new(vec![
            vec![Value::I16(1), Value::F64(0.5)],
            vec![Value::I16(2), Value::F64(1.5)],
        ]);
        assert_eq!(source.known_len(), Some(2));
        assert_eq!(
            source.next_row(),
            Some(vec![Value::I16(1), Value::F64(0.5)])
        );
        assert_eq!(
            source.next_row(),
            Some(vec![Value::I16(2), Value::F64(1.5)])
        );
        assert_eq!(source.next_row(), None);
    }
}
