//! IdentifyPeriod handler.
//!
//! Reads the operator's period request and elicits a confirmed date range
//! against the session history.

use std::sync::Arc;

use crate::application::elicitation::{ElicitationError, FieldElicitor};
use crate::application::prompts;
use crate::domain::elicitation::{DateRange, ElicitedField};
use crate::domain::foundation::ValidationError;
use crate::domain::session::SessionContext;
use crate::ports::{AIProvider, OperatorConsole, OperatorError};

use super::read_request;

/// Errors that end the period phase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentifyPeriodError {
    #[error("no period request was entered")]
    NoRequest,

    #[error(transparent)]
    Elicitation(#[from] ElicitationError),

    #[error("operator unavailable: {0}")]
    Operator(#[from] OperatorError),

    #[error("session context rejected the period: {0}")]
    Context(#[from] ValidationError),
}

/// Result of a confirmed period.
#[derive(Debug, Clone)]
pub struct IdentifyPeriodResult {
    pub range: DateRange,
    pub attempts: u32,
}

/// Handler for the period phase.
pub struct IdentifyPeriodHandler<A: AIProvider> {
    elicitor: Arc<FieldElicitor<A>>,
}

impl<A: AIProvider> IdentifyPeriodHandler<A> {
    pub fn new(elicitor: Arc<FieldElicitor<A>>) -> Self {
        Self { elicitor }
    }

    pub async fn handle(
        &self,
        ctx: &mut SessionContext,
        console: &mut dyn OperatorConsole,
    ) -> Result<IdentifyPeriodResult, IdentifyPeriodError> {
        let request = read_request(console, prompts::PERIOD_QUESTION, self.elicitor.max_attempts())
            .await?
            .ok_or(IdentifyPeriodError::NoRequest)?;

        // The request belongs to this phase and goes with it on failure.
        let checkpoint = ctx.history().checkpoint();
        ctx.history_mut().record_user(request)?;

        let system = prompts::elicitation_system(prompts::PERIOD_TASK, &DateRange::schema());
        let elicited = match self
            .elicitor
            .elicit::<DateRange>(ctx.id(), &system, ctx.history_mut(), console)
            .await
        {
            Ok(elicited) => elicited,
            Err(err) => {
                ctx.history_mut().rollback(checkpoint);
                return Err(err.into());
            }
        };

        ctx.confirm_date_range(elicited.value.clone())?;

        Ok(IdentifyPeriodResult {
            range: elicited.value,
            attempts: elicited.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::console::ScriptedConsole;
    use crate::application::oracle::StructuredOracle;
    use crate::domain::foundation::SiteId;
    use chrono::NaiveDate;
    use serde_json::json;

    fn handler(provider: MockAIProvider) -> IdentifyPeriodHandler<MockAIProvider> {
        let oracle = Arc::new(StructuredOracle::new(Arc::new(provider)));
        IdentifyPeriodHandler::new(Arc::new(FieldElicitor::new(oracle)))
    }

    fn context() -> SessionContext {
        SessionContext::start(
            SiteId::new("111").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn confirms_period_into_context() {
        let handler = handler(MockAIProvider::new().with_json(
            json!({"date_from": "2025-02-01", "date_to": "2025-02-28", "reasoning": "last month"}),
        ));
        let mut ctx = context();
        let mut console = ScriptedConsole::new(["先月", "y"]);

        let result = handler.handle(&mut ctx, &mut console).await.unwrap();

        assert_eq!(result.range.to(), "2025-02-28");
        assert_eq!(ctx.date_range(), Some(&result.range));
        let last = ctx.history().turns().last().unwrap();
        assert!(last.content().contains("2025-02-01 to 2025-02-28"));
    }

    #[tokio::test]
    async fn blank_requests_are_reasked() {
        let handler = handler(MockAIProvider::new().with_json(
            json!({"date_from": "2025-02-01", "date_to": "2025-02-28", "reasoning": "ok"}),
        ));
        let mut ctx = context();
        let mut console = ScriptedConsole::new(["", "  ", "2月", "y"]);

        handler.handle(&mut ctx, &mut console).await.unwrap();

        assert_eq!(console.prompts()[..3], [prompts::PERIOD_QUESTION; 3]);
    }

    #[tokio::test]
    async fn failure_leaves_history_untouched() {
        let handler = handler(MockAIProvider::new().with_json(
            json!({"date_from": "2025-02-01", "date_to": "2025-02-28", "reasoning": "ok"}),
        ));
        let mut ctx = context();
        let before = ctx.history().clone();
        let mut console = ScriptedConsole::new(["2月"]);

        let err = handler.handle(&mut ctx, &mut console).await.unwrap_err();

        assert!(matches!(
            err,
            IdentifyPeriodError::Elicitation(ElicitationError::Operator(OperatorError::Closed))
        ));
        assert_eq!(ctx.history(), &before);
        assert!(ctx.date_range().is_none());
    }
}
