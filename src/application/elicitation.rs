//! Field elicitation loop.
//!
//! Repeatedly asks the oracle for a field, validates the answer, and puts
//! valid answers through the confirmation gate. Rejections are appended to
//! the transcript as corrective turns so the next round sees them.
//!
//! The loop is bounded: every oracle round counts as one attempt, whatever
//! its outcome, and running out of attempts abandons the elicitation. An
//! abandoned elicitation leaves the transcript exactly as it found it.

use std::sync::Arc;

use crate::domain::conversation::{ConversationHistory, HistoryCheckpoint};
use crate::domain::elicitation::{ElicitationState, ElicitedField, Rejection, ValidationOutcome};
use crate::domain::foundation::{SessionId, StateMachine, ValidationError};
use crate::ports::{AIProvider, OperatorConsole, OperatorError};

use super::confirmation::ConfirmationGate;
use super::oracle::{OracleError, StructuredOracle};
use super::prompts;

/// Default number of oracle rounds per field.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Errors that end an elicitation.
///
/// Communication failures, malformed answers and rule violations are
/// retried inside the loop and never surface here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ElicitationError {
    #[error("could not determine {field} after {attempts} attempts")]
    Exhausted { field: &'static str, attempts: u32 },

    #[error("operator unavailable: {0}")]
    Operator(#[from] OperatorError),

    #[error("invalid elicitation state change: {0}")]
    InvalidTransition(ValidationError),

    #[error("transcript rejected a turn: {0}")]
    Transcript(ValidationError),
}

/// A confirmed value and how it was reached.
#[derive(Debug, Clone)]
pub struct Elicited<T> {
    pub value: T,
    /// Oracle rounds used.
    pub attempts: u32,
    /// Every state the loop passed through, starting with `Awaiting`.
    pub states: Vec<ElicitationState>,
}

/// Runs bounded elicitation loops against one oracle.
pub struct FieldElicitor<A: AIProvider> {
    oracle: Arc<StructuredOracle<A>>,
    gate: ConfirmationGate,
    max_attempts: u32,
}

impl<A: AIProvider> FieldElicitor<A> {
    pub fn new(oracle: Arc<StructuredOracle<A>>) -> Self {
        Self {
            oracle,
            gate: ConfirmationGate::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Elicits one `F` using `transcript` as the oracle's conversation.
    ///
    /// The transcript is appended to on every round. On any error it is
    /// rolled back to its length at entry.
    pub async fn elicit<F: ElicitedField>(
        &self,
        session_id: SessionId,
        system: &str,
        transcript: &mut ConversationHistory,
        console: &mut dyn OperatorConsole,
    ) -> Result<Elicited<F>, ElicitationError> {
        let checkpoint = transcript.checkpoint();
        let mut run = Run {
            session_id,
            system,
            lifecycle: Lifecycle::new(),
            attempts: 0,
            user_text: transcript
                .last_user_turn()
                .map(|t| t.content().to_string())
                .unwrap_or_default(),
        };

        match self.drive::<F>(&mut run, transcript, console).await {
            Ok(value) => {
                tracing::info!(
                    %session_id,
                    field = F::field_name(),
                    attempts = run.attempts,
                    value = %value.summary(),
                    "Field confirmed"
                );
                Ok(Elicited {
                    value,
                    attempts: run.attempts,
                    states: run.lifecycle.visited,
                })
            }
            Err(err) => {
                self.abandon(&mut run.lifecycle, transcript, checkpoint);
                tracing::warn!(
                    %session_id,
                    field = F::field_name(),
                    attempts = run.attempts,
                    error = %err,
                    "Elicitation abandoned"
                );
                Err(err)
            }
        }
    }

    async fn drive<F: ElicitedField>(
        &self,
        run: &mut Run<'_>,
        transcript: &mut ConversationHistory,
        console: &mut dyn OperatorConsole,
    ) -> Result<F, ElicitationError> {
        let field = F::field_name();
        let schema = F::schema();

        loop {
            if run.attempts >= self.max_attempts {
                return Err(ElicitationError::Exhausted {
                    field,
                    attempts: run.attempts,
                });
            }
            run.attempts += 1;
            tracing::debug!(
                session_id = %run.session_id,
                field,
                attempt = run.attempts,
                max_attempts = self.max_attempts,
                "Requesting candidate"
            );

            let answer = match self
                .oracle
                .ask_structured::<F::Candidate>(run.session_id, run.system, &schema, transcript)
                .await
            {
                Ok(answer) => answer,
                Err(OracleError::MalformedResponse { message, .. }) => {
                    tracing::warn!(field, attempt = run.attempts, %message, "Malformed oracle answer");
                    run.lifecycle.advance(ElicitationState::Validating)?;
                    record_derived(transcript, prompts::malformed(field, &message))?;
                    run.lifecycle.advance(ElicitationState::Awaiting)?;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(field, attempt = run.attempts, error = %err, "Oracle call failed");
                    run.lifecycle.advance(ElicitationState::Awaiting)?;
                    continue;
                }
            };

            run.lifecycle.advance(ElicitationState::Validating)?;
            record_derived(transcript, prompts::proposal(field, &answer.raw))?;

            match F::validate(answer.value, &run.user_text) {
                ValidationOutcome::Valid(value) => {
                    run.lifecycle.advance(ElicitationState::Confirming)?;
                    let label = prompts::label(field);
                    if self.gate.confirm(console, &label, &value.summary()).await? {
                        run.lifecycle.advance(ElicitationState::Done)?;
                        return Ok(value);
                    }

                    let correction = console.prompt_line(prompts::CORRECTION_QUESTION).await?;
                    record_operator_text(
                        transcript,
                        &correction,
                        prompts::rejected_without_comment(field),
                    )?;
                    run.user_text = correction;
                    run.lifecycle.advance(ElicitationState::Awaiting)?;
                }
                ValidationOutcome::Invalid(rejection) => {
                    tracing::debug!(
                        field,
                        attempt = run.attempts,
                        reason = %rejection.reason,
                        incomplete = rejection.is_incomplete(),
                        "Candidate rejected"
                    );
                    record_derived(transcript, prompts::corrective(field, &rejection.reason))?;
                    if rejection.is_incomplete() {
                        self.clarify::<F>(run, &rejection, transcript, console)
                            .await?;
                    }
                    run.lifecycle.advance(ElicitationState::Awaiting)?;
                }
            }
        }
    }

    /// Relays the oracle's question and records the operator's answer.
    async fn clarify<F: ElicitedField>(
        &self,
        run: &mut Run<'_>,
        rejection: &Rejection,
        transcript: &mut ConversationHistory,
        console: &mut dyn OperatorConsole,
    ) -> Result<(), ElicitationError> {
        let question = rejection
            .question
            .clone()
            .unwrap_or_else(|| prompts::clarification_fallback(F::field_name()));
        let answer = console.prompt_line(&question).await?;
        if !answer.trim().is_empty() {
            transcript
                .record_user(answer.trim())
                .map_err(ElicitationError::Transcript)?;
            run.user_text = answer;
        }
        Ok(())
    }

    fn abandon(
        &self,
        lifecycle: &mut Lifecycle,
        transcript: &mut ConversationHistory,
        checkpoint: HistoryCheckpoint,
    ) {
        if !lifecycle.current.is_terminal() {
            // Every non-terminal state may be abandoned.
            lifecycle.current = ElicitationState::Abandoned;
            lifecycle.visited.push(ElicitationState::Abandoned);
        }
        transcript.rollback(checkpoint);
    }
}

/// Mutable state of one elicitation.
struct Run<'s> {
    session_id: SessionId,
    system: &'s str,
    lifecycle: Lifecycle,
    attempts: u32,
    /// The operator's latest free text, used by keyword fallbacks.
    user_text: String,
}

/// Current state plus the path taken to reach it.
#[derive(Debug)]
struct Lifecycle {
    current: ElicitationState,
    visited: Vec<ElicitationState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            current: ElicitationState::Awaiting,
            visited: vec![ElicitationState::Awaiting],
        }
    }

    fn advance(&mut self, to: ElicitationState) -> Result<(), ElicitationError> {
        let next = self
            .current
            .transition_to(to)
            .map_err(ElicitationError::InvalidTransition)?;
        tracing::trace!(from = ?self.current, to = ?next, "Elicitation state change");
        self.current = next;
        self.visited.push(next);
        Ok(())
    }
}

fn record_derived(
    transcript: &mut ConversationHistory,
    text: String,
) -> Result<(), ElicitationError> {
    transcript
        .record_derived(text)
        .map_err(ElicitationError::Transcript)
}

/// Records operator text, or `fallback` as a derived turn when it is blank.
fn record_operator_text(
    transcript: &mut ConversationHistory,
    text: &str,
    fallback: String,
) -> Result<(), ElicitationError> {
    if text.trim().is_empty() {
        record_derived(transcript, fallback)
    } else {
        transcript
            .record_user(text.trim())
            .map_err(ElicitationError::Transcript)
    }
}
