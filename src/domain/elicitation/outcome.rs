//! Result of checking an oracle candidate against a field's domain rules.

use crate::domain::foundation::ValidationError;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The value is present but breaks a domain rule.
    Violation,
    /// The oracle left the value (partly) unfilled; the operator has to add
    /// information before another round makes sense.
    Incomplete,
}

/// A rejected candidate with the reason echoed back to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
    /// The oracle's own explanation or question for the operator, if any.
    pub question: Option<String>,
}

impl Rejection {
    pub fn violation(reason: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::Violation,
            reason: reason.into(),
            question: None,
        }
    }

    pub fn incomplete(reason: impl Into<String>, question: Option<String>) -> Self {
        Self {
            kind: RejectionKind::Incomplete,
            reason: reason.into(),
            question: question.filter(|q| !q.trim().is_empty()),
        }
    }

    pub fn is_incomplete(&self) -> bool {
        self.kind == RejectionKind::Incomplete
    }
}

impl From<ValidationError> for Rejection {
    fn from(err: ValidationError) -> Self {
        Self::violation(err.to_string())
    }
}

/// Tagged validation result that drives whether the loop retries or proceeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome<T> {
    Valid(T),
    Invalid(Rejection),
}

impl<T> ValidationOutcome<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(rejection) => Some(rejection),
        }
    }
}

impl<T> From<Result<T, ValidationError>> for ValidationOutcome<T> {
    fn from(result: Result<T, ValidationError>) -> Self {
        match result {
            Ok(value) => Self::Valid(value),
            Err(err) => Self::Invalid(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_becomes_violation() {
        let outcome: ValidationOutcome<()> =
            Err(ValidationError::empty_field("date_from")).into();

        let rejection = outcome.rejection().unwrap();
        assert_eq!(rejection.kind, RejectionKind::Violation);
        assert!(rejection.reason.contains("date_from"));
    }

    #[test]
    fn incomplete_drops_blank_question() {
        let rejection = Rejection::incomplete("missing", Some("  ".to_string()));
        assert!(rejection.question.is_none());
        assert!(rejection.is_incomplete());
    }

    #[test]
    fn valid_unwraps_value() {
        let outcome: ValidationOutcome<u8> = Ok(3).into();
        assert!(outcome.is_valid());
        assert_eq!(outcome.valid(), Some(3));
    }
}
