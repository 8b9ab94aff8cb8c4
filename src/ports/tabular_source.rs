//! Tabular Source Port - read-only access to the two analytics record sets.
//!
//! Both record sets are externally managed; the port only filters and
//! aggregates them into text tables.

use std::path::PathBuf;

use crate::domain::analytics::{PageQuery, Table};
use crate::domain::foundation::SiteId;

/// Port for the page-analytics and site-descriptor record sets.
pub trait TabularSource: Send + Sync {
    /// Runs a filter/aggregate query over the page-analytics rows.
    ///
    /// An empty result is an empty table, not an error.
    fn query_pages(&self, query: &PageQuery) -> Result<Table, TabularError>;

    /// Returns the `service` and `overview` columns for one site.
    fn query_site(&self, site_id: &SiteId) -> Result<Table, TabularError>;
}

/// Tabular source errors.
#[derive(Debug, thiserror::Error)]
pub enum TabularError {
    #[error("data file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("column '{column}' not present in {}", path.display())]
    UnknownColumn { path: PathBuf, column: String },

    #[error("no row for site '{0}'")]
    SiteNotFound(String),
}

impl TabularError {
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            path: path.into(),
            column: column.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_file() {
        let err = TabularError::unknown_column("data/site.csv", "overview");
        assert_eq!(
            err.to_string(),
            "column 'overview' not present in data/site.csv"
        );
        assert_eq!(
            TabularError::SiteNotFound("111".into()).to_string(),
            "no row for site '111'"
        );
    }
}
