//! Conversation memory facade with key validation.

use std::sync::Arc;

use crate::common::errors::{HomeError, HomeResult};
use crate::memory::conversation_id::ConversationId;
use crate::memory::store::ChatMemoryStore;
use crate::memory::turn::Turn;

/// Agent memory keyed by caller-supplied conversation ids.
///
/// Every operation converts its key first; a key that is not a non-empty string
/// fails with [`HomeError::Validation`] and the store is never called.
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ChatMemoryStore>,
}

impl ConversationMemory {
    /// Wrap a chat memory store.
    #[must_use]
    pub fn new(store: Arc<dyn ChatMemoryStore>) -> Self {
        Self { store }
    }

    /// Load the turns for a conversation.
    ///
    /// # Errors
    /// Returns a validation error for a bad key, or a storage error.
    pub async fn get_turns<K>(&self, key: K) -> HomeResult<Vec<Turn>>
    where
        K: TryInto<ConversationId, Error = HomeError>,
    {
        let id = key.try_into()?;
        self.store.get_turns(&id).await
    }

    /// Overwrite the turns for a conversation.
    ///
    /// # Errors
    /// Returns a validation error for a bad key, or a storage error.
    pub async fn replace_turns<K>(&self, key: K, turns: Vec<Turn>) -> HomeResult<()>
    where
        K: TryInto<ConversationId, Error = HomeError>,
    {
        let id = key.try_into()?;
        self.store.replace_turns(&id, turns).await
    }

    /// Delete the turns for a conversation.
    ///
    /// # Errors
    /// Returns a validation error for a bad key, or a storage error.
    pub async fn delete_turns<K>(&self, key: K) -> HomeResult<()>
    where
        K: TryInto<ConversationId, Error = HomeError>,
    {
        let id = key.try_into()?;
        self.store.delete_turns(&id).await
    }
}
