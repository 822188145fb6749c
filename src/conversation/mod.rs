//! Guided conversation: per-user state, intent classification, and the
//! dispatcher that drives both flows.

pub mod dispatcher;
pub mod intent;
pub mod keyboards;
pub mod replies;
pub mod state;
pub mod store;

pub use dispatcher::Dispatcher;
pub use intent::{Intent, ModeChoice, Role};
pub use state::{ConversationState, GROUPS, Group, StateKind};
pub use store::ConversationStore;
