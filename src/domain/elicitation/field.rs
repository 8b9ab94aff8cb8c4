//! The contract every elicited value implements.

use serde::de::DeserializeOwned;
use std::fmt::Debug;

use super::{SchemaDescriptor, ValidationOutcome};

/// A value that is hunted for by repeatedly querying the oracle.
///
/// The oracle answers with a `Candidate` shaped by `schema()`; `validate`
/// turns it into the confirmed value or a rejection.
pub trait ElicitedField: Sized + Clone + Debug + Send + Sync {
    /// Raw, best-effort answer decoded from the oracle. Every field must be
    /// optional so that an absent key decodes to `None`.
    type Candidate: DeserializeOwned + Debug + Send;

    /// Short name used in logs and errors (e.g. `date_range`).
    fn field_name() -> &'static str;

    fn schema() -> SchemaDescriptor;

    /// Applies the field's domain rules.
    ///
    /// `user_text` is the operator's most recent free-text input, for rules
    /// that fall back to keyword matching.
    fn validate(candidate: Self::Candidate, user_text: &str) -> ValidationOutcome<Self>;

    /// One-line rendering shown at the confirmation gate and folded back into
    /// the conversation history once confirmed.
    fn summary(&self) -> String;
}
