//! Append-only conversation history.
//!
//! The history is the context every oracle call sees. It is owned by the
//! session driver; elicitation rounds append corrective and user turns to it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Text typed by the human operator.
    User,
    /// Text generated by the program itself: corrective instructions,
    /// oracle answers folded back in, query results.
    SystemDerived,
}

/// A single immutable turn.
///
/// # Invariants
///
/// - `content` is non-empty after trimming (validated at construction)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: TurnRole,
    content: String,
}

impl Turn {
    /// Creates a new turn.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if content is blank
    pub fn new(role: TurnRole, content: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("turn.content"));
        }
        Ok(Self { role, content })
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(TurnRole::User, content)
    }

    /// Creates a system-derived turn.
    pub fn derived(content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(TurnRole::SystemDerived, content)
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Position in the history that can be restored later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCheckpoint(usize);

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history seeded with one user turn.
    pub fn seeded(content: impl Into<String>) -> Result<Self, ValidationError> {
        let mut history = Self::new();
        history.push(Turn::user(content)?);
        Ok(history)
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Appends a user turn.
    pub fn record_user(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        self.push(Turn::user(content)?);
        Ok(())
    }

    /// Appends a system-derived turn.
    pub fn record_derived(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        self.push(Turn::derived(content)?);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn typed by the operator, if any.
    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == TurnRole::User)
    }

    pub fn checkpoint(&self) -> HistoryCheckpoint {
        HistoryCheckpoint(self.turns.len())
    }

    /// Drops every turn appended after `checkpoint`.
    ///
    /// Turns present when the checkpoint was taken are never removed.
    pub fn rollback(&mut self, checkpoint: HistoryCheckpoint) {
        if checkpoint.0 < self.turns.len() {
            self.turns.truncate(checkpoint.0);
        }
    }
}
