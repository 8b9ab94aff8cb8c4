//! RunSession - drives one report session through its phases in order.
//!
//! 1. period (fatal on failure)
//! 2. service info (logged and skipped on failure)
//! 3. access data (fatal on failure)
//! 4. report (fatal on failure)
//!
//! A failed phase never undoes what earlier phases stored in the context.

use std::sync::Arc;

use crate::application::elicitation::FieldElicitor;
use crate::application::oracle::StructuredOracle;
use crate::domain::session::SessionContext;
use crate::ports::{AIProvider, OperatorConsole, ProviderInfo, TabularSource};

use super::{
    FetchAccessDataError, FetchAccessDataHandler, FetchServiceInfoHandler, GenerateReportError,
    GenerateReportHandler, IdentifyPeriodError, IdentifyPeriodHandler,
};

/// Which phase a session ended in.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("period phase failed: {0}")]
    Period(#[from] IdentifyPeriodError),

    #[error("access data phase failed: {0}")]
    AccessData(#[from] FetchAccessDataError),

    #[error("report phase failed: {0}")]
    Report(#[from] GenerateReportError),
}

/// The session driver.
pub struct RunSessionHandler<A: AIProvider, T: TabularSource> {
    period: IdentifyPeriodHandler<A>,
    service_info: FetchServiceInfoHandler<T>,
    access_data: FetchAccessDataHandler<A, T>,
    report: GenerateReportHandler<A>,
    provider: ProviderInfo,
}

impl<A: AIProvider, T: TabularSource> RunSessionHandler<A, T> {
    /// Wires every phase handler over one provider and one data source.
    pub fn new(provider: Arc<A>, source: Arc<T>, max_attempts: u32) -> Self {
        let info = provider.provider_info();
        let oracle = Arc::new(StructuredOracle::new(provider));
        let elicitor = Arc::new(FieldElicitor::new(oracle.clone()).with_max_attempts(max_attempts));

        Self {
            period: IdentifyPeriodHandler::new(elicitor.clone()),
            service_info: FetchServiceInfoHandler::new(source.clone()),
            access_data: FetchAccessDataHandler::new(elicitor, source),
            report: GenerateReportHandler::new(oracle),
            provider: info,
        }
    }

    pub async fn handle(
        &self,
        ctx: &mut SessionContext,
        console: &mut dyn OperatorConsole,
    ) -> Result<(), SessionError> {
        let session_id = ctx.id();
        tracing::info!(
            %session_id,
            site_id = %ctx.site_id(),
            provider = %self.provider.name,
            model = %self.provider.model,
            "Session started"
        );
        if let Err(e) = console
            .notify(&format!("Session {} (site {})", session_id.short(), ctx.site_id()))
            .await
        {
            tracing::warn!(%session_id, error = %e, "Could not show session banner");
        }

        let period = self.period.handle(ctx, console).await.map_err(|e| {
            tracing::error!(%session_id, error = %e, "Period phase failed");
            e
        })?;
        tracing::info!(%session_id, period = %period.range, attempts = period.attempts, "Period confirmed");

        if let Err(e) = self.service_info.handle(ctx) {
            tracing::warn!(%session_id, error = %e, "Continuing without service info");
        }

        let access = self.access_data.handle(ctx, console).await.map_err(|e| {
            tracing::error!(%session_id, error = %e, "Access data phase failed");
            e
        })?;
        tracing::debug!(%session_id, sql = %access.sql, "Access data stored");

        self.report.handle(ctx, console).await.map_err(|e| {
            tracing::error!(%session_id, error = %e, "Report phase failed");
            e
        })?;

        tracing::info!(%session_id, turns = ctx.history().len(), "Session finished");
        Ok(())
    }
}
