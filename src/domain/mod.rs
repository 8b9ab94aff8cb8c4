//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine trait)
//! - `conversation` - Append-only turn history shared with the oracle
//! - `elicitation` - Elicited fields, their rules and lifecycle states
//! - `session` - Per-session context threaded through every phase
//! - `analytics` - Page-analytics queries and result tables

pub mod analytics;
pub mod conversation;
pub mod elicitation;
pub mod foundation;
pub mod session;
