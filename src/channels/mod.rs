//! Channel abstraction for message I/O.

pub mod channel;
pub mod keyboard;
pub mod vk;

pub use channel::*;
pub use keyboard::{Button, ButtonColor, Keyboard};
pub use vk::VkChannel;
