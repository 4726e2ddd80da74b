//! Shared model types for roomwarden

pub mod types;

pub use types::{ChannelId, Timestamp, UserId};
