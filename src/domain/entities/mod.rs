//! Core domain entities.
//!
//! - [`Link`] - A stored short link
//! - [`NewLink`] - Validated input for creating or replacing a link
//! - [`LinkPage`] - Cursor-paginated listing result

pub mod link;

pub use link::{Link, LinkPage, NewLink};
