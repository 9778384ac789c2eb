//! Versioned mapping between log fields and positional blob slots.
//!
//! Stored analytics rows address values by slot only, so the order of slots
//! is the storage format. Slots are ordered by the number in their identifier
//! (`blob2` before `blob10`), never by declaration order or string order.
//! Schemas only grow: [`LogSchema::append`] adds a field in the next free slot.

use std::fmt;
use std::str::FromStr;

use super::field::LogField;

const SLOT_PREFIX: &str = "blob";

/// Errors raised while building a [`LogSchema`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid slot identifier '{0}', expected blob<N> with N >= 1")]
    InvalidSlot(String),
    #[error("slot {0} is declared more than once")]
    DuplicateSlot(BlobSlot),
    #[error("field '{0}' is mapped to more than one slot")]
    DuplicateField(LogField),
    #[error("slots must be numbered 1..={expected_last} without gaps, found {found}")]
    NonContiguous { expected_last: usize, found: BlobSlot },
    #[error("field '{0}' has no slot in this schema")]
    UnmappedField(LogField),
}

/// A positional slot identifier such as `blob7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobSlot(u16);

impl BlobSlot {
    /// Creates a slot from its 1-based number.
    pub fn new(number: u16) -> Result<Self, SchemaError> {
        if number == 0 {
            return Err(SchemaError::InvalidSlot(format!("{SLOT_PREFIX}0")));
        }
        Ok(Self(number))
    }

    /// The 1-based slot number.
    pub fn number(self) -> u16 {
        self.0
    }

    /// The column name used by the analytics store.
    pub fn column(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BlobSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SLOT_PREFIX}{}", self.0)
    }
}

impl FromStr for BlobSlot {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchemaError::InvalidSlot(s.to_string());

        let digits = s.strip_prefix(SLOT_PREFIX).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let number: u16 = digits.parse().map_err(|_| invalid())?;
        BlobSlot::new(number).map_err(|_| invalid())
    }
}

/// Ordered, versioned table of `(slot, field)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSchema {
    version: u32,
    entries: Vec<(BlobSlot, LogField)>,
}

impl LogSchema {
    /// Builds a schema from slot identifiers and fields in any order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if an identifier is malformed, a slot or field
    /// appears twice, or slot numbers are not exactly `1..=len`.
    pub fn new<'a, I>(version: u32, declared: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (&'a str, LogField)>,
    {
        let mut entries = declared
            .into_iter()
            .map(|(slot, field)| Ok((slot.parse::<BlobSlot>()?, field)))
            .collect::<Result<Vec<_>, SchemaError>>()?;

        entries.sort_by_key(|(slot, _)| slot.number());

        for (i, (slot, field)) in entries.iter().enumerate() {
            if i > 0 && entries[i - 1].0 == *slot {
                return Err(SchemaError::DuplicateSlot(*slot));
            }
            if entries[..i].iter().any(|(_, seen)| seen == field) {
                return Err(SchemaError::DuplicateField(*field));
            }
            if usize::from(slot.number()) != i + 1 {
                return Err(SchemaError::NonContiguous {
                    expected_last: entries.len(),
                    found: *slot,
                });
            }
        }

        Ok(Self { version, entries })
    }

    /// The schema used for all records written by this service.
    pub fn v1() -> Self {
        let declared: [(u16, LogField); LogField::COUNT] = [
            (1, LogField::Slug),
            (2, LogField::Url),
            (3, LogField::Ua),
            (4, LogField::Ip),
            (5, LogField::Source),
            (6, LogField::Country),
            (7, LogField::Region),
            (8, LogField::City),
            (9, LogField::Timezone),
            (10, LogField::Language),
            (11, LogField::Os),
            (12, LogField::Browser),
            (13, LogField::BrowserType),
            (14, LogField::Device),
            (15, LogField::DeviceType),
            (16, LogField::UtmSource),
            (17, LogField::UtmMedium),
            (18, LogField::UtmCampaign),
            (19, LogField::UtmTerm),
            (20, LogField::UtmContent),
        ];

        Self {
            version: 1,
            entries: declared
                .into_iter()
                .map(|(number, field)| (BlobSlot(number), field))
                .collect(),
        }
    }

    /// Returns a new schema with `field` in the next unused slot.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateField`] if the field is already mapped.
    pub fn append(&self, field: LogField) -> Result<Self, SchemaError> {
        if self.slot_of(field).is_some() {
            return Err(SchemaError::DuplicateField(field));
        }

        let next = u16::try_from(self.entries.len() + 1)
            .map_err(|_| SchemaError::InvalidSlot(format!("{SLOT_PREFIX}{}", self.entries.len() + 1)))?;

        let mut entries = self.entries.clone();
        entries.push((BlobSlot(next), field));

        Ok(Self {
            version: self.version + 1,
            entries,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of positional slots a record occupies.
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    pub fn slot_of(&self, field: LogField) -> Option<BlobSlot> {
        self.entries
            .iter()
            .find(|(_, f)| *f == field)
            .map(|(slot, _)| *slot)
    }

    /// Storage column holding `field`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnmappedField`] if the schema has no slot for it.
    pub fn column_of(&self, field: LogField) -> Result<String, SchemaError> {
        self.slot_of(field)
            .map(BlobSlot::column)
            .ok_or(SchemaError::UnmappedField(field))
    }

    pub fn field_at(&self, slot: BlobSlot) -> Option<LogField> {
        self.field_at_position(usize::from(slot.number()).checked_sub(1)?)
    }

    /// Field stored at a 0-based position of the encoded record.
    pub fn field_at_position(&self, position: usize) -> Option<LogField> {
        self.entries.get(position).map(|(_, field)| *field)
    }

    /// Iterates `(slot, field)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BlobSlot, LogField)> + '_ {
        self.entries.iter().copied()
    }

    /// Iterates fields in slot order.
    pub fn fields(&self) -> impl Iterator<Item = LogField> + '_ {
        self.entries.iter().map(|(_, field)| *field)
    }
}
