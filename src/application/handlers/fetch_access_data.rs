//! FetchAccessData handler.
//!
//! Elicits the columns the operator wants on a scratch transcript, then
//! queries the page-analytics data for the confirmed period and columns.

use std::sync::Arc;

use crate::application::elicitation::{ElicitationError, FieldElicitor};
use crate::application::prompts;
use crate::domain::analytics::PageQuery;
use crate::domain::conversation::ConversationHistory;
use crate::domain::elicitation::{ColumnSelection, ElicitedField};
use crate::domain::foundation::ValidationError;
use crate::domain::session::SessionContext;
use crate::ports::{AIProvider, OperatorConsole, OperatorError, TabularError, TabularSource};

use super::read_request;

#[derive(Debug, thiserror::Error)]
pub enum FetchAccessDataError {
    #[error("the reporting period has not been confirmed")]
    PeriodNotConfirmed,

    #[error("no data request was entered")]
    NoRequest,

    #[error(transparent)]
    Elicitation(#[from] ElicitationError),

    #[error(transparent)]
    Source(#[from] TabularError),

    #[error("operator unavailable: {0}")]
    Operator(#[from] OperatorError),

    #[error("session context rejected the access data: {0}")]
    Context(#[from] ValidationError),
}

/// What the access-data phase produced.
#[derive(Debug, Clone)]
pub struct AccessDataResult {
    pub columns: ColumnSelection,
    pub rows: usize,
    pub sql: String,
    /// Rendered text stored in the context.
    pub text: String,
}

/// Handler for the access-data phase.
pub struct FetchAccessDataHandler<A: AIProvider, T: TabularSource> {
    elicitor: Arc<FieldElicitor<A>>,
    source: Arc<T>,
}

impl<A: AIProvider, T: TabularSource> FetchAccessDataHandler<A, T> {
    pub fn new(elicitor: Arc<FieldElicitor<A>>, source: Arc<T>) -> Self {
        Self { elicitor, source }
    }

    pub async fn handle(
        &self,
        ctx: &mut SessionContext,
        console: &mut dyn OperatorConsole,
    ) -> Result<AccessDataResult, FetchAccessDataError> {
        let range = ctx
            .date_range()
            .cloned()
            .ok_or(FetchAccessDataError::PeriodNotConfirmed)?;

        console.notify(&prompts::columns_menu()).await?;
        let request =
            read_request(console, prompts::COLUMNS_QUESTION, self.elicitor.max_attempts())
                .await?
                .ok_or(FetchAccessDataError::NoRequest)?;

        let mut scratch = ConversationHistory::new();
        scratch.record_derived(prompts::columns_seed())?;
        scratch.record_user(request)?;

        let system =
            prompts::elicitation_system(prompts::COLUMNS_TASK, &ColumnSelection::schema());
        let columns = self
            .elicitor
            .elicit::<ColumnSelection>(ctx.id(), &system, &mut scratch, console)
            .await?
            .value;

        let query = PageQuery::new(range.clone(), columns.clone());
        let sql = query.to_sql();
        let table = self.source.query_pages(&query)?;
        tracing::info!(
            session_id = %ctx.id(),
            columns = %columns,
            rows = table.rows().len(),
            "Access data extracted"
        );

        let text = if table.is_empty() {
            format!("No matching rows for {}.\n\nSQL: {}", range, sql)
        } else {
            format!("{}\n\nSQL: {}", table.to_markdown(), sql)
        };
        console.notify(&text).await?;

        ctx.confirm_columns(columns.clone())?;
        ctx.record_access_data(text.clone())?;

        Ok(AccessDataResult {
            columns,
            rows: table.rows().len(),
            sql,
            text,
        })
    }
}
