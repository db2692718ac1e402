//! Chat agent that keeps its history in conversation memory.

use std::sync::Arc;

use tracing::info;

use crate::agent::gateway::ReplyGenerator;
use crate::common::errors::{HomeError, HomeResult};
use crate::memory::conversation::ConversationMemory;
use crate::memory::conversation_id::ConversationId;
use crate::memory::turn::Turn;

/// Conversation id used when the caller does not supply one.
pub const DEFAULT_CONVERSATION: &str = "default";

/// Routes a user message through the reply generator with stored history.
#[derive(Clone)]
pub struct StorageAgent {
    generator: Arc<dyn ReplyGenerator>,
    memory: ConversationMemory,
}

impl StorageAgent {
    /// Wire a generator to a conversation memory.
    #[must_use]
    pub fn new(generator: Arc<dyn ReplyGenerator>, memory: ConversationMemory) -> Self {
        Self { generator, memory }
    }

    /// Borrow the conversation memory.
    #[must_use]
    pub const fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answer `message` in the given conversation.
    ///
    /// The stored history becomes `[...prior, user, assistant]` only after the
    /// generator succeeds; a failed reply leaves memory untouched.
    ///
    /// # Errors
    /// Returns a validation error for a bad key, a storage error, or the
    /// generator's error unchanged.
    pub async fn chat<K>(&self, key: K, message: &str) -> HomeResult<String>
    where
        K: TryInto<ConversationId, Error = HomeError>,
    {
        let id = key.try_into()?;
        let mut turns = self.memory.get_turns(&id).await?;
        info!("Chat request for {id} with {} prior turns", turns.len());

        let reply = self.generator.generate_reply(&turns, message).await?;

        turns.push(Turn::user(message));
        turns.push(Turn::assistant(reply.clone()));
        self.memory.replace_turns(&id, turns).await?;

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio_rusqlite::Connection;

    use super::*;
    use crate::agent::gateway::AgentFuture;
    use crate::memory::store::SqliteChatMemoryStore;

    /// Echoes the message and records how much history it saw.
    #[derive(Default)]
    struct EchoGenerator {
        seen_history: Mutex<Vec<usize>>,
    }

    impl ReplyGenerator for EchoGenerator {
        fn generate_reply(
            &self,
            prior_turns: &[Turn],
            user_message: &str,
        ) -> AgentFuture<'_, HomeResult<String>> {
            self.seen_history.lock().unwrap().push(prior_turns.len());
            let reply = format!("echo: {user_message}");
            Box::pin(async move { Ok(reply) })
        }
    }

    struct FailingGenerator;

    impl ReplyGenerator for FailingGenerator {
        fn generate_reply(
            &self,
            _prior_turns: &[Turn],
            _user_message: &str,
        ) -> AgentFuture<'_, HomeResult<String>> {
            Box::pin(async {
                Err(HomeError::Completion(
                    rig::completion::CompletionError::ProviderError("model offline".to_string()),
                ))
            })
        }
    }

    async fn memory() -> ConversationMemory {
        let conn = Arc::new(Connection::open_in_memory().await.unwrap());
        ConversationMemory::new(Arc::new(SqliteChatMemoryStore::new(conn).await.unwrap()))
    }

    #[tokio::test]
    async fn test_chat_appends_both_turns() {
        let generator = Arc::new(EchoGenerator::default());
        let agent = StorageAgent::new(generator.clone(), memory().await);

        let first = agent.chat("kitchen", "we have eggs").await.unwrap();
        let second = agent.chat("kitchen", "and milk").await.unwrap();

        assert_eq!(first, "echo: we have eggs");
        assert_eq!(second, "echo: and milk");
        assert_eq!(*generator.seen_history.lock().unwrap(), vec![0, 2]);

        let turns = agent.memory().get_turns("kitchen").await.unwrap();
        assert_eq!(
            turns,
            vec![
                Turn::user("we have eggs"),
                Turn::assistant("echo: we have eggs"),
                Turn::user("and milk"),
                Turn::assistant("echo: and milk"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_reply_leaves_memory_untouched() {
        let memory = memory().await;
        memory.replace_turns("kitchen", vec![Turn::user("hi")]).await.unwrap();
        let agent = StorageAgent::new(Arc::new(FailingGenerator), memory);

        let err = agent.chat("kitchen", "anyone there?").await.unwrap_err();
        assert!(err.is_agent());
        assert_eq!(
            agent.memory().get_turns("kitchen").await.unwrap(),
            vec![Turn::user("hi")]
        );
    }

    #[tokio::test]
    async fn test_bad_key_is_rejected() {
        let generator = Arc::new(EchoGenerator::default());
        let agent = StorageAgent::new(generator.clone(), memory().await);

        let result = agent.chat(serde_json::json!(12), "hello").await;
        assert!(matches!(result, Err(HomeError::Validation(_))));
        assert!(generator.seen_history.lock().unwrap().is_empty());
    }
}
