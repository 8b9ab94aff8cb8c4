//! Session context threaded through every phase of a reporting session.
//!
//! A context is created once per session and passed by `&mut` to each phase.
//! It is the single writer of the session's conversation history: every
//! result a phase produces is stored here and also folded back into the
//! history so later oracle calls see it.

use chrono::NaiveDate;

use crate::domain::conversation::ConversationHistory;
use crate::domain::elicitation::{ColumnSelection, DateRange, DATE_FORMAT};
use crate::domain::foundation::{SessionId, SiteId, ValidationError};

/// Values confirmed by the operator during this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmedFields {
    pub date_range: Option<DateRange>,
    pub columns: Option<ColumnSelection>,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    id: SessionId,
    site_id: SiteId,
    execution_date: String,
    history: ConversationHistory,
    service_info: Option<String>,
    access_data: Option<String>,
    report: Option<String>,
    confirmed: ConfirmedFields,
}

impl SessionContext {
    /// Starts a session; the history is seeded with today's date so the
    /// oracle can resolve relative periods ("last month", "February").
    pub fn start(site_id: SiteId, today: NaiveDate) -> Result<Self, ValidationError> {
        let execution_date = today.format(DATE_FORMAT).to_string();
        let history = ConversationHistory::seeded(format!("Today's date is {}.", execution_date))?;

        Ok(Self {
            id: SessionId::new(),
            site_id,
            execution_date,
            history,
            service_info: None,
            access_data: None,
            report: None,
            confirmed: ConfirmedFields::default(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    pub fn execution_date(&self) -> &str {
        &self.execution_date
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    pub fn service_info(&self) -> Option<&str> {
        self.service_info.as_deref()
    }

    pub fn access_data(&self) -> Option<&str> {
        self.access_data.as_deref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn confirmed(&self) -> &ConfirmedFields {
        &self.confirmed
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.confirmed.date_range.as_ref()
    }

    pub fn columns(&self) -> Option<&ColumnSelection> {
        self.confirmed.columns.as_ref()
    }

    pub fn confirm_date_range(&mut self, range: DateRange) -> Result<(), ValidationError> {
        self.history
            .record_derived(format!("Confirmed reporting period: {}", range))?;
        self.confirmed.date_range = Some(range);
        Ok(())
    }

    pub fn confirm_columns(&mut self, columns: ColumnSelection) -> Result<(), ValidationError> {
        self.history
            .record_derived(format!("Confirmed columns: {}", columns))?;
        self.confirmed.columns = Some(columns);
        Ok(())
    }

    pub fn record_service_info(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = non_blank("service_info", text.into())?;
        self.history
            .record_derived(format!("# Service information\n{}", text))?;
        self.service_info = Some(text);
        Ok(())
    }

    pub fn record_access_data(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = non_blank("access_data", text.into())?;
        let period = self
            .confirmed
            .date_range
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_default();
        self.history.record_derived(format!(
            "# Analysis period\n{}\n\n# Extracted data\n{}",
            period, text
        ))?;
        self.access_data = Some(text);
        Ok(())
    }

    pub fn record_report(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = non_blank("report", text.into())?;
        self.history
            .record_derived(format!("# Generated report\n{}", text))?;
        self.report = Some(text);
        Ok(())
    }
}

fn non_blank(field: &str, text: String) -> Result<String, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::TurnRole;
    use crate::domain::elicitation::Column;

    fn context() -> SessionContext {
        SessionContext::start(
            SiteId::new("111").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn start_seeds_history_with_today() {
        let ctx = context();
        assert_eq!(ctx.execution_date(), "2025-03-05");
        assert_eq!(ctx.history().len(), 1);
        assert!(ctx.history().turns()[0].content().contains("2025-03-05"));
    }

    #[test]
    fn confirmed_fields_are_folded_into_history() {
        let mut ctx = context();
        ctx.confirm_date_range(DateRange::parse("2025-02-01", "2025-02-28").unwrap())
            .unwrap();
        ctx.confirm_columns(ColumnSelection::new([Column::Visits]).unwrap())
            .unwrap();

        assert_eq!(ctx.date_range().unwrap().from(), "2025-02-01");
        assert!(ctx.columns().unwrap().contains(Column::Visits));

        let last = ctx.history().turns().last().unwrap();
        assert_eq!(last.role(), TurnRole::SystemDerived);
        assert!(last.content().contains("訪問数"));
    }

    #[test]
    fn access_data_turn_mentions_period() {
        let mut ctx = context();
        ctx.confirm_date_range(DateRange::parse("2025-02-01", "2025-02-28").unwrap())
            .unwrap();
        ctx.record_access_data("| a |\n|---|\n| 1 |").unwrap();

        let last = ctx.history().turns().last().unwrap().content();
        assert!(last.contains("2025-02-01 to 2025-02-28"));
        assert_eq!(ctx.access_data(), Some("| a |\n|---|\n| 1 |"));
    }

    #[test]
    fn blank_results_are_rejected_without_mutation() {
        let mut ctx = context();
        assert!(ctx.record_report("  ").is_err());
        assert!(ctx.report().is_none());
        assert_eq!(ctx.history().len(), 1);
    }
}
