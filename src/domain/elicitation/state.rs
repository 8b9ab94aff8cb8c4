//! Elicitation state machine.
//!
//! Defines the lifecycle states of a single field elicitation and the valid
//! transitions between them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The lifecycle state of one field elicitation.
///
/// - `Awaiting`: waiting on the oracle's answer for the current round
/// - `Validating`: checking the answer against the field's domain rules
/// - `Confirming`: waiting on the operator's yes/no
/// - `Done`: value confirmed
/// - `Abandoned`: attempt budget exhausted or the operator went away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ElicitationState {
    #[default]
    Awaiting,
    Validating,
    Confirming,
    Done,
    Abandoned,
}

impl ElicitationState {
    /// Returns true if the loop should issue another oracle call.
    pub fn needs_oracle(&self) -> bool {
        matches!(self, Self::Awaiting)
    }

    /// Returns true if the operator is being asked for a decision.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::Confirming)
    }
}

impl StateMachine for ElicitationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ElicitationState::*;
        matches!(
            (self, target),
            // Oracle answered
            (Awaiting, Validating) |
            // Transport failed, same round is retried
            (Awaiting, Awaiting) |
            // Rejected by domain rules or undecodable
            (Validating, Awaiting) |
            (Validating, Confirming) |
            // Operator said no
            (Confirming, Awaiting) |
            (Confirming, Done) |
            (Awaiting, Abandoned) |
            (Validating, Abandoned) |
            (Confirming, Abandoned)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ElicitationState::*;
        match self {
            Awaiting => vec![Validating, Awaiting, Abandoned],
            Validating => vec![Awaiting, Confirming, Abandoned],
            Confirming => vec![Awaiting, Done, Abandoned],
            Done => vec![],
            Abandoned => vec![],
        }
    }
}
