//! Agent gateway and the storage agent that feeds it conversation memory.

pub mod gateway;
pub mod prompt;
pub mod storage_agent;

pub use gateway::{AgentFuture, OllamaReplyGenerator, ReplyGenerator, ScriptedReplyGenerator};
pub use prompt::build_prompt_block;
pub use storage_agent::{DEFAULT_CONVERSATION, StorageAgent};
