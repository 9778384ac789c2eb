//! Access-log record keyed by [`LogField`].

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::field::LogField;

/// Semantic access-log record: one optional value per [`LogField`].
///
/// Empty strings are stored as absent, so a record that went through the
/// positional encoding compares equal to the record it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessLogRecord {
    values: [Option<String>; LogField::COUNT],
}

impl AccessLogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: LogField) -> Option<&str> {
        self.values[field.ordinal()].as_deref()
    }

    pub fn set(&mut self, field: LogField, value: Option<String>) {
        self.values[field.ordinal()] = value.filter(|v| !v.is_empty());
    }

    /// Builder-style variant of [`Self::set`].
    pub fn with(mut self, field: LogField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Iterates the fields that carry a value, in [`LogField::ALL`] order.
    pub fn present(&self) -> impl Iterator<Item = (LogField, &str)> {
        LogField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

impl Serialize for AccessLogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.present() {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.end()
    }
}
