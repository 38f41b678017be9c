//! Named, insertion-ordered property bags.

use tdms_codec::Value;

/// An insertion-ordered mapping of property names to typed values.
///
/// Property order is part of the on-disk layout, so entries are kept in
/// the order they were first added; replacing a value does not move it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Value)>,
}

impl Properties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, returning whether the stored state changed.
    ///
    /// Setting a property to a value structurally equal to the stored one
    /// is a no-op and returns `false`; callers use that to suppress dirty
    /// marking.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, stored)) => {
                if *stored == value {
                    false
                } else {
                    *stored = value;
                    true
                }
            }
            None => {
                self.entries.push((name, value));
                true
            }
        }
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
