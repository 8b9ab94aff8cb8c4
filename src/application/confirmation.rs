//! Confirmation gate - the operator's explicit yes/no on an elicited value.

use crate::ports::{OperatorConsole, OperatorError};

use super::prompts;

/// Asks the operator to accept a candidate value.
///
/// Only `y`/`yes` (any case) accepts; every other answer is a rejection and
/// is handed back to the enclosing elicitation loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationGate;

impl ConfirmationGate {
    pub fn new() -> Self {
        Self
    }

    /// Interprets one answer line.
    pub fn is_affirmative(answer: &str) -> bool {
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    pub async fn confirm(
        &self,
        console: &mut dyn OperatorConsole,
        label: &str,
        summary: &str,
    ) -> Result<bool, OperatorError> {
        let answer = console
            .prompt_line(&format!("{}: {}\n{}", label, summary, prompts::CONFIRM_SUFFIX))
            .await?;
        let accepted = Self::is_affirmative(&answer);
        tracing::debug!(label, accepted, "Confirmation answered");
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::console::ScriptedConsole;

    #[test]
    fn only_yes_is_affirmative() {
        for yes in ["y", "Y", " yes ", "YES"] {
            assert!(ConfirmationGate::is_affirmative(yes), "{yes}");
        }
        for no in ["n", "no", "", "yeah", "ok", "はい"] {
            assert!(!ConfirmationGate::is_affirmative(no), "{no}");
        }
    }

    #[tokio::test]
    async fn shows_candidate_and_reads_answer() {
        let mut console = ScriptedConsole::new(["y"]);

        let accepted = ConfirmationGate::new()
            .confirm(&mut console, "Period", "2025-02-01 to 2025-02-28")
            .await
            .unwrap();

        assert!(accepted);
        assert_eq!(
            console.prompts(),
            vec!["Period: 2025-02-01 to 2025-02-28\nIs this correct? (y/n)"]
        );
    }

    #[tokio::test]
    async fn closed_input_is_an_error() {
        let mut console = ScriptedConsole::default();

        let result = ConfirmationGate::new()
            .confirm(&mut console, "Period", "x")
            .await;

        assert_eq!(result, Err(OperatorError::Closed));
    }
}
