//! Conversation memory for the agent.
//!
//! - `turn`: turn model (role, content, tool calls)
//! - `conversation_id`: validated caller-supplied key
//! - `store`: `ChatMemoryStore` trait and `SQLite` backend
//! - `conversation`: facade that validates keys before storage access

pub mod conversation;
pub mod conversation_id;
pub mod store;
pub mod turn;

pub use conversation::ConversationMemory;
pub use conversation_id::ConversationId;
pub use store::{ChatMemoryStore, SqliteChatMemoryStore};
pub use turn::{ToolCall, Turn, TurnRole};
