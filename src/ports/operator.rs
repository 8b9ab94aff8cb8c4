//! Operator Console Port - line-oriented dialogue with the human operator.
//!
//! The console is the only place the session blocks on a person. Prompts
//! and notices are written as whole lines; streamed oracle text is written
//! fragment by fragment without a trailing newline.

use async_trait::async_trait;

/// Port for the human side of the session.
#[async_trait]
pub trait OperatorConsole: Send {
    /// Shows `prompt` and waits for one line of input (without the newline).
    ///
    /// Returns `OperatorError::Closed` once the input stream has ended.
    async fn prompt_line(&mut self, prompt: &str) -> Result<String, OperatorError>;

    /// Shows a complete message.
    async fn notify(&mut self, message: &str) -> Result<(), OperatorError>;

    /// Shows a fragment of streamed text as soon as it arrives.
    async fn emit_fragment(&mut self, fragment: &str) -> Result<(), OperatorError>;
}

/// Failures talking to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperatorError {
    /// Input stream reached end of file.
    #[error("operator input closed")]
    Closed,

    /// Reading or writing the terminal failed.
    #[error("operator I/O failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for OperatorError {
    fn from(err: std::io::Error) -> Self {
        OperatorError::Io(err.to_string())
    }
}
