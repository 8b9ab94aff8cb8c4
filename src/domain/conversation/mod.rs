//! Conversation module - the turn history shared with the oracle.

mod history;

pub use history::{ConversationHistory, HistoryCheckpoint, Turn, TurnRole};
