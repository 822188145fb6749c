//! PreferenceStore: per-user bot/passthrough toggle.

use std::sync::Arc;

use tracing::{error, info};

use crate::channels::UserId;
use crate::store::traits::Database;

/// Whether a user is guided by the bot (`true`) or writes freely.
pub struct PreferenceStore {
    db: Arc<dyn Database>,
}

impl PreferenceStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Stored `use_bot`, defaulting to `true` when absent or unreadable.
    pub async fn get(&self, user_id: UserId) -> bool {
        match self.db.get_use_bot(user_id).await {
            Ok(value) => value.unwrap_or(true),
            Err(e) => {
                error!(user_id, "Failed to read user setting: {e}");
                true
            }
        }
    }

    /// Upsert `use_bot`. Returns `false` on a storage fault.
    pub async fn set(&self, user_id: UserId, use_bot: bool) -> bool {
        match self.db.set_use_bot(user_id, use_bot).await {
            Ok(()) => {
                info!(user_id, use_bot, "User preference updated");
                true
            }
            Err(e) => {
                error!(user_id, use_bot, "Failed to save user setting: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    async fn store() -> PreferenceStore {
        PreferenceStore::new(Arc::new(LibSqlBackend::new_memory().await.unwrap()))
    }

    #[tokio::test]
    async fn defaults_to_bot_mode() {
        let prefs = store().await;
        assert!(prefs.get(7).await);
    }

    #[tokio::test]
    async fn set_then_get() {
        let prefs = store().await;
        assert!(prefs.set(7, false).await);
        assert!(!prefs.get(7).await);
        assert!(prefs.set(7, true).await);
        assert!(prefs.get(7).await);
    }

    #[tokio::test]
    async fn consecutive_gets_agree() {
        let prefs = store().await;
        prefs.set(9, false).await;
        let first = prefs.get(9).await;
        let second = prefs.get(9).await;
        assert_eq!(first, second);
    }
}
