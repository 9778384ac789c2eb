//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod redirect;
pub mod stats;
pub mod verify;

pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, edit_link_handler, list_links_handler,
    query_link_handler,
};
pub use redirect::redirect_handler;
pub use stats::{counters_handler, metrics_handler, views_handler};
pub use verify::verify_handler;
