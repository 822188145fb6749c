//! VK video bot: guided collection of parent videos and teacher retrieval
//! by date.

pub mod channels;
pub mod config;
pub mod conversation;
pub mod error;
pub mod status;
pub mod store;
pub mod validation;
