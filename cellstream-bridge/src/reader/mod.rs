//! Phone-side feed intake: connection management and line reframing.

pub mod buffer;
pub mod connection;

pub use connection::{Endpoint, FeedReader};
