//! Oracle transport port.
//!
//! The elicitation loop and the report phase talk to the hosted language
//! model only through [`AIProvider`]. Answers arrive as a stream of text
//! fragments closed by a chunk carrying the finish reason; structured calls
//! attach a [`ResponseFormat`] describing the JSON object expected back.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::foundation::SessionId;

/// Boxed stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AIError>> + Send>>;

/// A hosted chat model.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Answer as fragments. Only the last chunk has a finish reason; a
    /// stream that ends without one was cut off.
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError>;

    /// Name, model and whether JSON Schema output is honoured natively.
    fn provider_info(&self) -> ProviderInfo;
}

/// One oracle call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Transcript in order.
    pub messages: Vec<Message>,
    /// Sent ahead of the transcript.
    pub system_prompt: Option<String>,
    /// Constrains the answer to a JSON object of a given shape.
    pub response_format: Option<ResponseFormat>,
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            response_format: None,
            temperature: None,
            metadata,
        }
    }

    /// Replaces the conversation messages.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Requests a structured answer.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// One transcript entry as the provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions and session-generated notes.
    System,
    /// The operator's own words.
    User,
}

/// Shape constraint for structured answers.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// A JSON object matching `schema` (a JSON Schema document).
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// Carried into log fields; never sent to the provider.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub session_id: SessionId,
    /// What the call is for (e.g. `identify_period`), used in log fields.
    pub purpose: String,
}

impl RequestMetadata {
    pub fn new(session_id: SessionId, purpose: impl Into<String>) -> Self {
        Self {
            session_id,
            purpose: purpose.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// The completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Token limit reached; the answer is probably incomplete.
    Length,
    ContentFilter,
}

impl FinishReason {
    /// Unknown reasons count as a normal stop.
    pub fn from_provider(reason: &str) -> Self {
        match reason {
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        }
    }
}

/// One streamed fragment, or the closing chunk.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub delta: String,
    /// Set on the closing chunk only.
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            finish_reason: None,
            usage: None,
        }
    }

    pub fn final_chunk(finish_reason: FinishReason, usage: TokenUsage) -> Self {
        Self {
            delta: String::new(),
            finish_reason: Some(finish_reason),
            usage: Some(usage),
        }
    }

    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    /// Honours `ResponseFormat::JsonSchema` natively.
    pub supports_json_schema: bool,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            supports_json_schema: false,
        }
    }

    pub fn with_json_schema(mut self, supports: bool) -> Self {
        self.supports_json_schema = supports;
        self
    }
}

/// Transport-level failures. The oracle treats all of them as a
/// communication error for the current round.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AIError {
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("context too long for the model")]
    ContextTooLong,

    /// 5xx or overloaded.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    /// The provider's own envelope could not be read.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Worth another HTTP attempt inside the adapter.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
