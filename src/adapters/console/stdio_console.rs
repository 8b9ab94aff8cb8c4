//! Terminal console - the operator dialogue on stdin/stdout.

use async_trait::async_trait;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::ports::{OperatorConsole, OperatorError};

/// Operator console bound to the process's standard streams.
///
/// Logs go to stderr, so stdout carries only the dialogue.
pub struct StdioConsole {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
}

impl StdioConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
            stdout: io::stdout(),
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), OperatorError> {
        self.stdout.write_all(text.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

impl Default for StdioConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperatorConsole for StdioConsole {
    async fn prompt_line(&mut self, prompt: &str) -> Result<String, OperatorError> {
        self.write(prompt).await?;
        if !prompt.ends_with(char::is_whitespace) {
            self.write(" ").await?;
        }

        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim_end_matches('\r').to_string()),
            None => Err(OperatorError::Closed),
        }
    }

    async fn notify(&mut self, message: &str) -> Result<(), OperatorError> {
        self.write(message).await?;
        self.write("\n").await
    }

    async fn emit_fragment(&mut self, fragment: &str) -> Result<(), OperatorError> {
        self.write(fragment).await
    }
}
