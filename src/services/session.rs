//! Per-chat wizard state.
//!
//! Session state is ephemeral by contract: discarded on restart, on cancel,
//! and after every generation attempt. It is keyed by chat identity, not user
//! identity, which assumes the single-user-per-chat usage model and would
//! conflate participants if a chat were ever shared.

use std::collections::HashMap;
use tokio::sync::RwLock;

/// Wizard position for one chat. One variant per step, each carrying exactly
/// the fields that are valid at that step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Image mode chosen, waiting for the source photo.
    AwaitingPhoto,
    /// Text mode chosen, waiting for a prompt (or a JSON fast-path payload).
    AwaitingTextPrompt,
    /// Photo captured, waiting for a prompt (or a JSON fast-path payload).
    AwaitingImagePrompt { photo: String },
    AwaitingTextRatio { prompt: String },
    AwaitingImageRatio { prompt: String, photo: String },
    AwaitingTextQuality { prompt: String, aspect_ratio: String },
    AwaitingImageQuality {
        prompt: String,
        aspect_ratio: String,
        photo: String,
    },
}

/// Swappable per-chat session storage. Transition logic only ever talks to
/// this interface, so an externally persisted impl could be dropped in
/// without touching the wizard.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: i64) -> Option<Session>;

    async fn set(&self, chat_id: i64, session: Session);

    /// Discards any session for the chat. Returns whether one existed.
    async fn remove(&self, chat_id: i64) -> bool;
}

/// Process-memory session map. Last writer wins; no cross-await transaction.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: i64) -> Option<Session> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    async fn set(&self, chat_id: i64, session: Session) {
        self.sessions.write().await.insert(chat_id, session);
    }

    async fn remove(&self, chat_id: i64) -> bool {
        self.sessions.write().await.remove(&chat_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(1).await, None);

        store.set(1, Session::AwaitingTextPrompt).await;
        assert_eq!(store.get(1).await, Some(Session::AwaitingTextPrompt));

        // Overwrite wins.
        store
            .set(
                1,
                Session::AwaitingTextRatio {
                    prompt: "a cat".to_string(),
                },
            )
            .await;
        assert!(matches!(
            store.get(1).await,
            Some(Session::AwaitingTextRatio { .. })
        ));

        assert!(store.remove(1).await);
        assert!(!store.remove(1).await);
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn chats_are_isolated() {
        let store = InMemorySessionStore::new();
        store.set(1, Session::AwaitingPhoto).await;
        store.set(2, Session::AwaitingTextPrompt).await;

        assert_eq!(store.get(1).await, Some(Session::AwaitingPhoto));
        assert_eq!(store.get(2).await, Some(Session::AwaitingTextPrompt));

        store.remove(1).await;
        assert_eq!(store.get(2).await, Some(Session::AwaitingTextPrompt));
    }
}
