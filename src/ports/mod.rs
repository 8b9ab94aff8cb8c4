//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Hosted language model (the oracle), streaming or not
//! - `OperatorConsole` - Line-oriented dialogue with the human operator
//! - `TabularSource` - Page-analytics and site-descriptor record sets

mod ai_provider;
mod operator;
mod tabular_source;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, ResponseFormat, StreamChunk, TokenUsage,
};
pub use operator::{OperatorConsole, OperatorError};
pub use tabular_source::{TabularError, TabularSource};
