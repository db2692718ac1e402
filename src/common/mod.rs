//! Shared configuration, errors and identifiers.

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{AppConfig, LlmConfig, LlmProvider, ServerConfig, StorageConfig};
pub use errors::{HomeError, HomeResult};
pub use ids::{EntryId, RecordId};
