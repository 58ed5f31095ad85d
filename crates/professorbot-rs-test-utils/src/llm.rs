//! Chat model stubs implementing `autoagents_llm::LLMProvider`.

use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::ToolCall;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// Chat providers here only answer chat calls; everything else fails.
macro_rules! chat_only_provider {
    ($name:ty) => {
        #[async_trait]
        impl CompletionProvider for $name {
            async fn complete(
                &self,
                _req: &CompletionRequest,
                _json_schema: Option<StructuredOutputFormat>,
            ) -> Result<CompletionResponse, LLMError> {
                Err(LLMError::ProviderError("completion not scripted".to_string()))
            }
        }

        #[async_trait]
        impl EmbeddingProvider for $name {
            async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
                Err(LLMError::ProviderError("embedding not scripted".to_string()))
            }
        }

        #[async_trait]
        impl ModelsProvider for $name {}

        impl LLMProvider for $name {}
    };
}

#[derive(Debug, Clone)]
pub struct FixedChatResponse {
    text: String,
}

impl FixedChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for FixedChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl ChatResponse for FixedChatResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Replies from a queue, recording every request it receives.
///
/// `Err` entries become provider errors. An exhausted script fails the call.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLLM {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedLLM {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = replies.into_iter().map(|reply| Ok(reply.into())).collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(reply.into()));
        self
    }

    /// Queue a provider failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Err(message.into()));
        self
    }

    /// Every request seen so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<Vec<ChatMessage>> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for ScriptedLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.calls.lock().push(messages.to_vec());
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(reply)) => Ok(Box::new(FixedChatResponse::new(reply))),
            Some(Err(message)) => Err(LLMError::ProviderError(message)),
            None => Err(LLMError::ProviderError("script exhausted".to_string())),
        }
    }
}

chat_only_provider!(ScriptedLLM);

/// Always fails with a provider error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

chat_only_provider!(FailingLLM);

/// Holds each reply until the test opens the gate.
#[derive(Debug, Clone)]
pub struct GatedLLM {
    reply: String,
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedLLM {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            entered: Arc::new(Notify::new()),
            gate: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a chat call is waiting at the gate.
    pub async fn wait_for_call(&self) {
        self.entered.notified().await;
    }

    /// Let one waiting call return.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl ChatProvider for GatedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(Box::new(FixedChatResponse::new(self.reply.clone())))
    }
}

chat_only_provider!(GatedLLM);
