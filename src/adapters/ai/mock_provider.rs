//! Scripted oracle.
//!
//! Provides a scripted implementation of the AIProvider port, allowing the
//! elicitation loop and the session driver to run without a hosted model.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Structured (JSON) responses built from `serde_json::Value`
//! - Error injection, including streams cut off before the completion marker
//! - Every request is kept for assertions
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_json(json!({"date_from": "2025-02-01", "date_to": "2025-02-28", "reasoning": "ok"}))
//!     .with_response("Monthly report ...");
//!
//! let stream = provider.stream_complete(request).await?;
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Characters per simulated stream fragment.
const FRAGMENT_CHARS: usize = 8;

/// Answers requests from a queue, in order.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Streamed in fragments, then closed normally.
    Success {
        content: String,
        finish_reason: FinishReason,
    },
    /// Stream the content but never send the completion marker.
    Truncated { content: String },
    Error(MockError),
}

/// Failures the script can inject.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1")
                .with_json_schema(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful text response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Adds a successful structured response to the queue.
    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_response(value.to_string())
    }

    /// Adds a response whose stream ends without a completion marker.
    pub fn with_truncated(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Truncated {
            content: content.into(),
        })
    }

    /// Queues a transport failure.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Falls back to a plain text answer once the script runs out.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
                finish_reason: FinishReason::Stop,
            })
    }

    async fn record(&self, request: CompletionRequest) {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

/// Splits content into fixed-size fragments without altering it.
fn fragments(content: &str) -> Vec<Result<StreamChunk, AIError>> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(FRAGMENT_CHARS)
        .map(|c| Ok(StreamChunk::content(c.iter().collect::<String>())))
        .collect()
}

fn usage_for(content: &str) -> TokenUsage {
    TokenUsage::new(10, (content.chars().count() / 4).max(1) as u32)
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        self.record(request).await;

        match self.next_response() {
            MockResponse::Success {
                content,
                finish_reason,
            } => {
                let final_chunk = StreamChunk::final_chunk(finish_reason, usage_for(&content));
                let chunks = stream::iter(fragments(&content)).chain(stream::once(async move {
                    Ok(final_chunk)
                }));
                Ok(Box::pin(chunks))
            }
            MockResponse::Truncated { content } => Ok(Box::pin(stream::iter(fragments(&content)))),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
