//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the state machine trait and the validation error
//! type used across the reporting domain.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{SessionId, SiteId};
pub use state_machine::StateMachine;
