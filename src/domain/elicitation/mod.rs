//! Elicitation module - values hunted for through the oracle.
//!
//! Holds the elicitation state machine, the validation outcome type, the
//! schema descriptors sent to the oracle, and the two elicited fields:
//! the reporting period and the column selection.

mod columns;
mod date_range;
mod field;
mod outcome;
mod schema;
mod state;

pub use columns::{Column, ColumnCandidate, ColumnSelection};
pub use date_range::{canonicalize, DateRange, DateRangeCandidate, DATE_FORMAT};
pub use field::ElicitedField;
pub use outcome::{Rejection, RejectionKind, ValidationOutcome};
pub use schema::{FieldDescriptor, FieldKind, SchemaDescriptor, REASONING_FIELD};
pub use state::ElicitationState;
