//! ConversationStore: in-memory per-user conversation state.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::channels::UserId;

use super::state::ConversationState;

/// Keyed state store injected into the dispatcher. Not persisted: a
/// restart sends every user back to `Start`.
#[derive(Default)]
pub struct ConversationStore {
    states: RwLock<HashMap<UserId, ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `Start` for users never seen.
    pub async fn get(&self, user_id: UserId) -> ConversationState {
        self.states
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: UserId, state: ConversationState) {
        let mut states = self.states.write().await;
        if state.is_start() {
            states.remove(&user_id);
        } else {
            states.insert(user_id, state);
        }
    }

    /// Drop the user's entry along with any captured fields.
    pub async fn reset(&self, user_id: UserId) {
        self.states.write().await.remove(&user_id);
    }

    /// Number of users with an active conversation.
    pub async fn active_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::StateKind;

    #[tokio::test]
    async fn unseen_user_is_start() {
        let store = ConversationStore::new();
        assert_eq!(store.get(1).await.kind(), StateKind::Start);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn set_get_reset() {
        let store = ConversationStore::new();
        store.set(1, ConversationState::ChooseRole).await;
        store.set(2, ConversationState::TeacherEnterDate).await;
        assert_eq!(store.get(1).await, ConversationState::ChooseRole);
        assert_eq!(store.active_count().await, 2);

        store.reset(1).await;
        assert!(store.get(1).await.is_start());
        assert_eq!(store.get(2).await, ConversationState::TeacherEnterDate);
    }

    #[tokio::test]
    async fn setting_start_removes_entry() {
        let store = ConversationStore::new();
        store.set(1, ConversationState::ChooseMode).await;
        store.set(1, ConversationState::Start).await;
        assert_eq!(store.active_count().await, 0);
    }
}
