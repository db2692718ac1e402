//! Reply generation capability backed by a language model.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;
use rig::providers::ollama;
use tracing::debug;

use crate::agent::prompt::build_prompt_block;
use crate::common::config::LlmConfig;
use crate::common::errors::{HomeError, HomeResult};
use crate::memory::turn::Turn;

/// Boxed future type for reply generation.
pub type AgentFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces a reply given the prior conversation and a new user message.
pub trait ReplyGenerator: Send + Sync {
    /// Generate the assistant reply.
    ///
    /// # Errors
    /// Returns an error if the model cannot be reached or fails.
    fn generate_reply(
        &self,
        prior_turns: &[Turn],
        user_message: &str,
    ) -> AgentFuture<'_, HomeResult<String>>;
}

/// Ollama-backed reply generator using the Rig provider.
pub struct OllamaReplyGenerator {
    model: ollama::CompletionModel,
    preamble: String,
    temperature: f64,
    max_tokens: Option<u64>,
    history_window: usize,
}

impl OllamaReplyGenerator {
    /// Create a new generator from config.
    ///
    /// # Errors
    /// Returns an error if the Ollama client cannot be built.
    pub fn new(config: &LlmConfig) -> HomeResult<Self> {
        let builder = ollama::Client::<ReqwestClient>::builder().api_key(rig::client::Nothing);
        let builder = if let Some(base_url) = &config.base_url {
            builder.base_url(base_url)
        } else {
            builder
        };
        let client = builder.build().map_err(HomeError::from)?;
        let model = client.completion_model(config.model.clone());

        Ok(Self {
            model,
            preamble: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            history_window: config.history_window,
        })
    }
}

impl ReplyGenerator for OllamaReplyGenerator {
    fn generate_reply(
        &self,
        prior_turns: &[Turn],
        user_message: &str,
    ) -> AgentFuture<'_, HomeResult<String>> {
        let prompt = build_prompt_block(prior_turns, self.history_window, user_message);
        let prior_count = prior_turns.len();
        Box::pin(async move {
            debug!("Generating reply with {prior_count} prior turns");

            let request = self
                .model
                .completion_request(prompt)
                .preamble(self.preamble.clone())
                .temperature(self.temperature)
                .max_tokens_opt(self.max_tokens)
                .build();

            let response = self.model.completion(request).await?;
            Ok(extract_text(&response.choice))
        })
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}

/// Generator that cycles through canned replies.
pub struct ScriptedReplyGenerator {
    replies: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedReplyGenerator {
    /// Create a generator over `replies`.
    ///
    /// # Errors
    /// Returns an error if `replies` is empty.
    pub fn new(replies: Vec<String>) -> HomeResult<Self> {
        if replies.is_empty() {
            return Err(HomeError::InvalidConfig(
                "scripted generator needs at least one reply".to_string(),
            ));
        }
        Ok(Self {
            replies,
            next: AtomicUsize::new(0),
        })
    }
}

impl ReplyGenerator for ScriptedReplyGenerator {
    fn generate_reply(
        &self,
        _prior_turns: &[Turn],
        _user_message: &str,
    ) -> AgentFuture<'_, HomeResult<String>> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        let reply = self.replies[index].clone();
        Box::pin(async move { Ok(reply) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_cycles() {
        let generator =
            ScriptedReplyGenerator::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(generator.generate_reply(&[], "hi").await.unwrap());
        }
        assert_eq!(seen, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_scripted_rejects_empty() {
        assert!(ScriptedReplyGenerator::new(Vec::new()).is_err());
    }

    #[test]
    fn test_ollama_generator_builds_offline() {
        let config = LlmConfig {
            base_url: Some("http://127.0.0.1:11434".to_string()),
            ..LlmConfig::default()
        };
        assert!(OllamaReplyGenerator::new(&config).is_ok());
    }
}
