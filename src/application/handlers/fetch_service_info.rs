//! FetchServiceInfo handler - looks up the site's service description.

use std::sync::Arc;

use crate::domain::foundation::ValidationError;
use crate::domain::session::SessionContext;
use crate::ports::{TabularError, TabularSource};

#[derive(Debug, thiserror::Error)]
pub enum FetchServiceInfoError {
    #[error(transparent)]
    Source(#[from] TabularError),

    #[error("session context rejected the service info: {0}")]
    Context(#[from] ValidationError),
}

/// Handler for the service-info phase.
pub struct FetchServiceInfoHandler<T: TabularSource> {
    source: Arc<T>,
}

impl<T: TabularSource> FetchServiceInfoHandler<T> {
    pub fn new(source: Arc<T>) -> Self {
        Self { source }
    }

    /// Stores the site's service table in the context and returns it as
    /// Markdown.
    pub fn handle(&self, ctx: &mut SessionContext) -> Result<String, FetchServiceInfoError> {
        let table = self.source.query_site(ctx.site_id())?;
        let markdown = table.to_markdown();
        ctx.record_service_info(markdown.clone())?;
        tracing::info!(session_id = %ctx.id(), site_id = %ctx.site_id(), "Service info loaded");
        Ok(markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv::CsvTabularSource;
    use crate::domain::foundation::SiteId;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn context(site: &str) -> SessionContext {
        SessionContext::start(
            SiteId::new(site).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap()
    }

    fn sites() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "site_id,service,overview\n111,Acme CRM,Cloud CRM").unwrap();
        file
    }

    #[test]
    fn records_service_table() {
        let sites = sites();
        let handler =
            FetchServiceInfoHandler::new(Arc::new(CsvTabularSource::new("unused.csv", sites.path())));
        let mut ctx = context("111");

        let markdown = handler.handle(&mut ctx).unwrap();

        assert!(markdown.contains("| Acme CRM | Cloud CRM |"));
        assert_eq!(ctx.service_info(), Some(markdown.as_str()));
    }

    #[test]
    fn unknown_site_leaves_context_empty() {
        let sites = sites();
        let handler =
            FetchServiceInfoHandler::new(Arc::new(CsvTabularSource::new("unused.csv", sites.path())));
        let mut ctx = context("999");

        let err = handler.handle(&mut ctx).unwrap_err();

        assert!(matches!(err, FetchServiceInfoError::Source(TabularError::SiteNotFound(_))));
        assert!(ctx.service_info().is_none());
    }
}
