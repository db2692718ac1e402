//! Caller-supplied conversation key.
//!
//! Conversation ids come from outside (HTTP paths, JSON bodies) and are opaque
//! strings. Anything that is not a non-empty string is rejected here, before
//! any storage is touched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::errors::HomeError;

/// Opaque conversation identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    /// Borrow the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ConversationId> for String {
    fn from(value: ConversationId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = HomeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(HomeError::Validation(
                "conversation id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for ConversationId {
    type Error = HomeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl TryFrom<&String> for ConversationId {
    type Error = HomeError;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        Self::try_from(value.clone())
    }
}

impl TryFrom<&Self> for ConversationId {
    type Error = HomeError;

    fn try_from(value: &Self) -> Result<Self, Self::Error> {
        Ok(value.clone())
    }
}

impl TryFrom<serde_json::Value> for ConversationId {
    type Error = HomeError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(text) => Self::try_from(text),
            other => Err(HomeError::Validation(format!(
                "expected string conversation id but found {}",
                json_kind(&other)
            ))),
        }
    }
}

impl TryFrom<&serde_json::Value> for ConversationId {
    type Error = HomeError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        Self::try_from(value.clone())
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
