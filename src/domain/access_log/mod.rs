//! Access-log record model and its positional storage format.
//!
//! Every redirect produces one [`AccessLogRecord`]. The analytics backend
//! stores it as an ordered list of string blobs whose order is defined by a
//! [`LogSchema`]; [`LogCodec`] converts between the two representations.
//!
//! # Layout
//!
//! - [`field`] - Closed set of semantic field names
//! - [`schema`] - Versioned, append-only field ↔ slot table
//! - [`record`] - Field-keyed record
//! - [`codec`] - Encoder/decoder bound to a schema

pub mod codec;
pub mod field;
pub mod record;
pub mod schema;

pub use codec::LogCodec;
pub use field::{LogField, UnknownLogField};
pub use record::AccessLogRecord;
pub use schema::{BlobSlot, LogSchema, SchemaError};
