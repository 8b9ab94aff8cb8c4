//! Structured oracle call.
//!
//! One request/response exchange with the language model. The answer is
//! always consumed as a stream and assembled here; a stream that ends without
//! its completion marker is treated as a transport failure.

use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::domain::conversation::{ConversationHistory, TurnRole};
use crate::domain::elicitation::SchemaDescriptor;
use crate::domain::foundation::SessionId;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, Message, MessageRole, OperatorConsole,
    RequestMetadata, ResponseFormat,
};

/// Oracle call failures. Both are recoverable by retrying the round.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not be reached or the stream broke off.
    #[error("oracle unreachable: {0}")]
    Communication(#[from] AIError),

    /// The answer could not be decoded against the requested schema.
    #[error("malformed {schema} answer: {message}")]
    MalformedResponse { schema: String, message: String },

    /// Nothing to send.
    #[error("oracle request without conversation history")]
    EmptyHistory,
}

impl OracleError {
    pub fn is_communication(&self) -> bool {
        matches!(self, OracleError::Communication(_))
    }
}

/// A decoded structured answer together with the text it came from.
#[derive(Debug, Clone)]
pub struct StructuredAnswer<T> {
    pub value: T,
    pub raw: String,
}

/// Issues oracle calls over an `AIProvider`.
pub struct StructuredOracle<A: AIProvider> {
    provider: Arc<A>,
}

impl<A: AIProvider> StructuredOracle<A> {
    pub fn new(provider: Arc<A>) -> Self {
        Self { provider }
    }

    /// Asks for a value shaped like `schema`.
    ///
    /// Providers without native JSON Schema output get no response format;
    /// the system prompt carries the expected shape for them.
    pub async fn ask_structured<T: DeserializeOwned>(
        &self,
        session_id: SessionId,
        system: &str,
        schema: &SchemaDescriptor,
        history: &ConversationHistory,
    ) -> Result<StructuredAnswer<T>, OracleError> {
        let mut request = self
            .request(session_id, schema.name, system, history)?
            .with_temperature(0.0);
        if self.provider.provider_info().supports_json_schema {
            request = request.with_response_format(ResponseFormat::JsonSchema {
                name: schema.name.to_string(),
                schema: schema.to_json_schema(),
            });
        }

        let raw = self.assemble(request, None).await?;
        let value = decode(schema.name, &raw)?;
        Ok(StructuredAnswer { value, raw })
    }

    /// Asks for free text, echoing fragments to `echo` while they arrive.
    ///
    /// A failing echo only stops the echo; the text is still assembled.
    pub async fn ask_text(
        &self,
        session_id: SessionId,
        purpose: &str,
        system: &str,
        history: &ConversationHistory,
        echo: Option<&mut dyn OperatorConsole>,
    ) -> Result<String, OracleError> {
        let request = self.request(session_id, purpose, system, history)?;
        self.assemble(request, echo).await
    }

    fn request(
        &self,
        session_id: SessionId,
        purpose: &str,
        system: &str,
        history: &ConversationHistory,
    ) -> Result<CompletionRequest, OracleError> {
        if history.is_empty() {
            return Err(OracleError::EmptyHistory);
        }

        Ok(CompletionRequest::new(RequestMetadata::new(session_id, purpose))
            .with_system_prompt(system)
            .with_messages(to_messages(history)))
    }

    async fn assemble(
        &self,
        request: CompletionRequest,
        mut echo: Option<&mut dyn OperatorConsole>,
    ) -> Result<String, OracleError> {
        let purpose = request.metadata.purpose.clone();
        let session_id = request.metadata.session_id;
        tracing::debug!(
            %session_id,
            purpose = %purpose,
            turns = request.messages.len(),
            "Calling oracle"
        );

        let mut stream = self.provider.stream_complete(request).await?;
        let mut content = String::new();
        let mut finished = None;

        while let Some(item) = stream.next().await {
            let chunk = item?;
            if !chunk.delta.is_empty() {
                let echo_failure = match echo.as_deref_mut() {
                    Some(console) => console.emit_fragment(&chunk.delta).await.err(),
                    None => None,
                };
                if let Some(e) = echo_failure {
                    tracing::warn!(error = %e, "Echo to operator failed, continuing silently");
                    echo = None;
                }
                content.push_str(&chunk.delta);
            }
            if chunk.is_final() {
                finished = chunk.finish_reason;
                if let Some(usage) = chunk.usage {
                    tracing::debug!(
                        %session_id,
                        purpose = %purpose,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Oracle call finished"
                    );
                }
                break;
            }
        }

        if finished.is_none() {
            return Err(AIError::network("stream ended before the completion marker").into());
        }
        Ok(content)
    }
}

fn to_messages(history: &ConversationHistory) -> Vec<Message> {
    history
        .turns()
        .iter()
        .map(|turn| {
            let role = match turn.role() {
                TurnRole::User => MessageRole::User,
                TurnRole::SystemDerived => MessageRole::System,
            };
            Message::new(role, turn.content())
        })
        .collect()
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn decode<T: DeserializeOwned>(schema: &str, raw: &str) -> Result<T, OracleError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(OracleError::MalformedResponse {
            schema: schema.to_string(),
            message: "empty answer".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| OracleError::MalformedResponse {
        schema: schema.to_string(),
        message: e.to_string(),
    })
}
