//! Domain layer containing business entities and logic.
//!
//! Independent of HTTP and storage concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Link records
//! - [`access_log`] - Access-log record, field registry and positional codec
//! - [`stats`] - Statistics query model and result rows
//! - [`repositories`] - Storage trait definitions
//!
//! # Access Log Flow
//!
//! 1. Redirect handler resolves the link
//! 2. [`crate::utils::request_signals::SignalExtractor`] builds an [`access_log::AccessLogRecord`]
//! 3. [`access_log::LogCodec`] encodes it into positional blobs
//! 4. [`repositories::AnalyticsRepository`] stores the blobs keyed by link id

pub mod access_log;
pub mod entities;
pub mod repositories;
pub mod stats;
