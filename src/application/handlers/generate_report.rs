//! GenerateReport handler - streams the final report to the operator.

use std::sync::Arc;

use crate::application::oracle::{OracleError, StructuredOracle};
use crate::application::prompts;
use crate::domain::foundation::ValidationError;
use crate::domain::session::SessionContext;
use crate::ports::{AIProvider, OperatorConsole, OperatorError};

const NO_SERVICE_INFO: &str = "(no service information available)";

#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerateReportError {
    #[error("access data must be extracted before the report")]
    MissingAccessData,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("operator unavailable: {0}")]
    Operator(#[from] OperatorError),

    #[error("session context rejected the report: {0}")]
    Context(#[from] ValidationError),
}

/// Handler for the report phase.
pub struct GenerateReportHandler<A: AIProvider> {
    oracle: Arc<StructuredOracle<A>>,
}

impl<A: AIProvider> GenerateReportHandler<A> {
    pub fn new(oracle: Arc<StructuredOracle<A>>) -> Self {
        Self { oracle }
    }

    /// Generates the report, echoing it while it streams, and stores it.
    pub async fn handle(
        &self,
        ctx: &mut SessionContext,
        console: &mut dyn OperatorConsole,
    ) -> Result<String, GenerateReportError> {
        let access_data = ctx
            .access_data()
            .ok_or(GenerateReportError::MissingAccessData)?;
        let period = ctx
            .date_range()
            .map(|r| r.to_string())
            .unwrap_or_default();
        let service_info = ctx.service_info().unwrap_or(NO_SERVICE_INFO);

        let mut transcript = ctx.history().clone();
        transcript.record_derived(prompts::report_instruction(
            &period,
            service_info,
            access_data,
        ))?;

        let report = self
            .oracle
            .ask_text(
                ctx.id(),
                "report",
                prompts::REPORT_SYSTEM,
                &transcript,
                Some(&mut *console),
            )
            .await?;
        console.notify("").await?;

        ctx.record_report(report.clone())?;
        tracing::info!(session_id = %ctx.id(), chars = report.chars().count(), "Report generated");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::console::ScriptedConsole;
    use crate::domain::elicitation::DateRange;
    use crate::domain::foundation::SiteId;
    use chrono::NaiveDate;

    fn ready_context() -> SessionContext {
        let mut ctx = SessionContext::start(
            SiteId::new("111").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap();
        ctx.confirm_date_range(DateRange::parse("2025-02-01", "2025-02-28").unwrap())
            .unwrap();
        ctx.record_access_data("| ページタイトル | 訪問数 |").unwrap();
        ctx
    }

    fn handler(provider: Arc<MockAIProvider>) -> GenerateReportHandler<MockAIProvider> {
        GenerateReportHandler::new(Arc::new(StructuredOracle::new(provider)))
    }

    #[tokio::test]
    async fn streams_and_records_report() {
        let provider = Arc::new(MockAIProvider::new().with_response("## Summary\nVisits rose."));
        let mut ctx = ready_context();
        let mut console = ScriptedConsole::default();

        let report = handler(provider.clone())
            .handle(&mut ctx, &mut console)
            .await
            .unwrap();

        assert_eq!(report, "## Summary\nVisits rose.");
        assert_eq!(console.streamed_text(), report);
        assert_eq!(ctx.report(), Some(report.as_str()));

        let instruction = provider.get_calls()[0].messages.last().cloned().unwrap();
        assert!(instruction.content.contains("2025-02-01 to 2025-02-28"));
        assert!(instruction.content.contains(NO_SERVICE_INFO));
    }

    #[tokio::test]
    async fn requires_access_data() {
        let provider = Arc::new(MockAIProvider::new());
        let mut ctx = SessionContext::start(
            SiteId::new("111").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap();
        let mut console = ScriptedConsole::default();

        let err = handler(provider.clone())
            .handle(&mut ctx, &mut console)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerateReportError::MissingAccessData));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn oracle_failure_keeps_history() {
        let provider = Arc::new(MockAIProvider::new().with_error(MockError::Unavailable {
            message: "down".into(),
        }));
        let mut ctx = ready_context();
        let before = ctx.history().clone();
        let mut console = ScriptedConsole::default();

        let err = handler(provider).handle(&mut ctx, &mut console).await.unwrap_err();

        assert!(matches!(err, GenerateReportError::Oracle(OracleError::Communication(_))));
        assert_eq!(ctx.history(), &before);
        assert!(ctx.report().is_none());
    }
}
