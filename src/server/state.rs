//! Application state shared across all request handlers.

use std::sync::Arc;

use tokio_rusqlite::Connection;
use tracing::info;

use crate::agent::gateway::{OllamaReplyGenerator, ReplyGenerator, ScriptedReplyGenerator};
use crate::agent::storage_agent::StorageAgent;
use crate::common::config::{AppConfig, LlmProvider};
use crate::common::errors::HomeResult;
use crate::memory::conversation::ConversationMemory;
use crate::memory::store::SqliteChatMemoryStore;
use crate::pantry::entry_store::SqliteEntryStore;
use crate::pantry::service::PantryService;

/// Shared application state.
pub struct AppState {
    /// Inventory reconciler.
    pub pantry: PantryService,
    /// Chat agent with conversation memory.
    pub agent: StorageAgent,
    /// Display name reported by the health endpoint.
    pub app_name: String,
}

impl AppState {
    /// Open the database and build every service from config.
    ///
    /// # Errors
    /// Returns an error if the database or the model client cannot be set up.
    pub async fn new(config: &AppConfig) -> HomeResult<Arc<Self>> {
        let conn = Arc::new(Connection::open(&config.storage.sqlite_path).await?);
        info!("Opened database at {}", config.storage.sqlite_path.display());

        let entry_store = Arc::new(SqliteEntryStore::new(conn.clone()).await?);
        let memory_store = Arc::new(SqliteChatMemoryStore::new(conn).await?);

        let generator: Arc<dyn ReplyGenerator> = match config.llm.provider {
            LlmProvider::Ollama => Arc::new(OllamaReplyGenerator::new(&config.llm)?),
            LlmProvider::Scripted => Arc::new(ScriptedReplyGenerator::new(
                config.llm.scripted_replies.clone(),
            )?),
        };

        Ok(Self::from_parts(
            PantryService::new(entry_store),
            StorageAgent::new(generator, ConversationMemory::new(memory_store)),
            config.app_name.clone(),
        ))
    }

    /// Assemble state from already-built services.
    #[must_use]
    pub fn from_parts(pantry: PantryService, agent: StorageAgent, app_name: String) -> Arc<Self> {
        Arc::new(Self {
            pantry,
            agent,
            app_name,
        })
    }
}
