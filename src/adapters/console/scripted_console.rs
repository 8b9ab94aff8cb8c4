//! Scripted console - canned operator answers for tests and demos.

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::ports::{OperatorConsole, OperatorError};

/// Something the session showed the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutput {
    Prompt(String),
    Notice(String),
    Fragment(String),
}

/// Console that answers prompts from a queue and records everything shown.
///
/// Once the queue is empty every prompt fails with `OperatorError::Closed`,
/// the same as end of input on a terminal.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    outputs: Vec<ConsoleOutput>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            outputs: Vec::new(),
        }
    }

    pub fn outputs(&self) -> &[ConsoleOutput] {
        &self.outputs
    }

    /// Prompts shown, in order.
    pub fn prompts(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                ConsoleOutput::Prompt(p) => Some(p.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Notices shown, in order.
    pub fn notices(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                ConsoleOutput::Notice(n) => Some(n.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All streamed fragments joined together.
    pub fn streamed_text(&self) -> String {
        self.outputs
            .iter()
            .filter_map(|o| match o {
                ConsoleOutput::Fragment(f) => Some(f.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl OperatorConsole for ScriptedConsole {
    async fn prompt_line(&mut self, prompt: &str) -> Result<String, OperatorError> {
        self.outputs.push(ConsoleOutput::Prompt(prompt.to_string()));
        self.answers.pop_front().ok_or(OperatorError::Closed)
    }

    async fn notify(&mut self, message: &str) -> Result<(), OperatorError> {
        self.outputs.push(ConsoleOutput::Notice(message.to_string()));
        Ok(())
    }

    async fn emit_fragment(&mut self, fragment: &str) -> Result<(), OperatorError> {
        self.outputs.push(ConsoleOutput::Fragment(fragment.to_string()));
        Ok(())
    }
}
