//! Durable per-conversation turn history.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{OptionalExtension, TransactionBehavior};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::common::errors::HomeResult;
use crate::common::ids::RecordId;
use crate::memory::conversation_id::ConversationId;
use crate::memory::turn::Turn;

/// Boxed future type for chat memory operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat memory store trait.
///
/// Each conversation maps to one record holding the whole ordered history.
/// Concurrent writers to the same id are last-writer-wins.
pub trait ChatMemoryStore: Send + Sync {
    /// Load the history for a conversation, empty if none was ever written.
    ///
    /// # Errors
    /// Returns an error if storage access fails or the stored blob is corrupt.
    fn get_turns(&self, id: &ConversationId) -> StoreFuture<'_, HomeResult<Vec<Turn>>>;

    /// Overwrite the history for a conversation, creating the record if needed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn replace_turns(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
    ) -> StoreFuture<'_, HomeResult<()>>;

    /// Remove the history for a conversation. Unknown ids are a no-op.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_turns(&self, id: &ConversationId) -> StoreFuture<'_, HomeResult<()>>;
}

/// `SQLite` implementation of the chat memory store.
pub struct SqliteChatMemoryStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteChatMemoryStore {
    /// Table name for chat memory records.
    pub const DEFAULT_TABLE: &'static str = "chat_memory";

    /// Initialize the store and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>) -> HomeResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    memory_id TEXT NOT NULL UNIQUE,
                    json TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl ChatMemoryStore for SqliteChatMemoryStore {
    fn get_turns(&self, id: &ConversationId) -> StoreFuture<'_, HomeResult<Vec<Turn>>> {
        let memory_id = id.as_str().to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let lookup_id = memory_id.clone();
            let json = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!("SELECT json FROM {table} WHERE memory_id = ?1"),
                            rusqlite::params![lookup_id],
                            |row| row.get::<_, String>(0),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;

            match json {
                Some(json) => Ok(serde_json::from_str(&json)?),
                None => {
                    debug!("No chat memory for {memory_id}");
                    Ok(Vec::new())
                }
            }
        })
    }

    fn replace_turns(
        &self,
        id: &ConversationId,
        turns: Vec<Turn>,
    ) -> StoreFuture<'_, HomeResult<()>> {
        let memory_id = id.as_str().to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let json = serde_json::to_string(&turns)?;
            let now = Utc::now().timestamp_millis();
            let count = turns.len();

            self.conn
                .call(move |conn| {
                    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                    let existing: Option<String> = tx
                        .query_row(
                            &format!("SELECT id FROM {table} WHERE memory_id = ?1"),
                            rusqlite::params![memory_id],
                            |row| row.get(0),
                        )
                        .optional()?;

                    match existing {
                        Some(row_id) => {
                            tx.execute(
                                &format!(
                                    "UPDATE {table} SET json = ?1, updated_at = ?2 WHERE id = ?3"
                                ),
                                rusqlite::params![json, now, row_id],
                            )?;
                        }
                        None => {
                            tx.execute(
                                &format!(
                                    "INSERT INTO {table} (id, memory_id, json, created_at, updated_at)
                                     VALUES (?1, ?2, ?3, ?4, ?4)"
                                ),
                                rusqlite::params![RecordId::new().to_string(), memory_id, json, now],
                            )?;
                        }
                    }

                    tx.commit()?;
                    Ok(())
                })
                .await?;

            debug!("Stored {count} turns");
            Ok(())
        })
    }

    fn delete_turns(&self, id: &ConversationId) -> StoreFuture<'_, HomeResult<()>> {
        let memory_id = id.as_str().to_string();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!("DELETE FROM {table} WHERE memory_id = ?1"),
                        rusqlite::params![memory_id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}
