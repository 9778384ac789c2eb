//! Request and identifier helpers.
//!
//! - [`slug_generator`] - Random slug and id generation
//! - [`user_agent`] - User-agent classification
//! - [`request_signals`] - Access-log extraction from request headers

pub mod request_signals;
pub mod slug_generator;
pub mod user_agent;
