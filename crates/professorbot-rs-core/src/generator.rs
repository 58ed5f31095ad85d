//! Dialogue generator backed by an `autoagents-llm` provider.

use crate::error::GeneratorError;
use crate::prompt::PromptSegment;
use crate::types::Role;
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use log::{debug, info, warn};
use professorbot_rs_config::ModelConfig;
use std::sync::Arc;

/// Shared handle to the hosted chat model.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl Generator {
    /// Wrap an already-built provider. `model` is only used for display and logs.
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Build an OpenAI-backed generator from the model config.
    pub fn openai(config: &ModelConfig, api_key: String) -> Result<Self, GeneratorError> {
        info!(
            "building generator (provider={}, model={}, temperature={})",
            config.provider, config.name, config.temperature
        );
        let provider: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
            .api_key(api_key)
            .model(config.name.clone())
            .temperature(config.temperature)
            .build()
            .map_err(|err| GeneratorError::Build(err.to_string()))?;
        Ok(Self::new(provider, config.name.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the segments and return the reply text.
    ///
    /// Blank replies are reported as [`GeneratorError::EmptyReply`].
    pub async fn generate(&self, segments: &[PromptSegment]) -> Result<String, GeneratorError> {
        let messages: Vec<ChatMessage> = segments.iter().map(to_chat_message).collect();
        debug!(
            "generator call (model={}, segments={})",
            self.model,
            messages.len()
        );
        let response = self
            .provider
            .chat_with_tools(&messages, None, None)
            .await
            .map_err(|err| {
                warn!("generator call failed (model={}, err={})", self.model, err);
                GeneratorError::Provider(err.to_string())
            })?;
        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GeneratorError::EmptyReply),
        }
    }
}

fn to_chat_message(segment: &PromptSegment) -> ChatMessage {
    let role = match segment.role {
        Role::System => ChatRole::System,
        Role::User => ChatRole::User,
        Role::Assistant => ChatRole::Assistant,
    };
    ChatMessage {
        role,
        message_type: MessageType::Text,
        content: segment.content.clone(),
    }
}
