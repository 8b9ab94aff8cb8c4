//! Reporting period value object.
//!
//! Dates travel as `yyyy-mm-dd` text. Ordering is checked on the canonical
//! (zero-padded, fixed-width) form, where lexicographic order equals
//! chronological order; input that parses but is not zero-padded is
//! normalised first.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{
    ElicitedField, FieldDescriptor, FieldKind, Rejection, SchemaDescriptor, ValidationOutcome,
};
use crate::domain::foundation::ValidationError;

/// The only accepted date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a date and returns it in canonical `yyyy-mm-dd` form.
///
/// Years must be unsigned and at most four digits, so every canonical
/// string has the same width.
pub fn canonicalize(field: &str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    let invalid = || {
        ValidationError::invalid_format(
            field,
            format!("'{}' is not a calendar date in yyyy-mm-dd form", trimmed),
        )
    };
    if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())?;
    if !(0..=9999).contains(&date.year()) {
        return Err(invalid());
    }
    Ok(date.format(DATE_FORMAT).to_string())
}

/// Inclusive date range with `from <= to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    from: String,
    to: String,
}

impl DateRange {
    /// Validates and normalises both bounds.
    ///
    /// # Errors
    ///
    /// - `EmptyField` / `InvalidFormat` if a bound is not a real date
    /// - `OutOfOrder` if the start is after the end
    pub fn parse(from: &str, to: &str) -> Result<Self, ValidationError> {
        let from = canonicalize("date_from", from)?;
        let to = canonicalize("date_to", to)?;

        if from > to {
            return Err(ValidationError::out_of_order(
                "date_range",
                format!("start date {} is after end date {}", from, to),
            ));
        }

        Ok(Self { from, to })
    }

    /// Canonical start date.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Canonical end date.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// True if `date` (canonical form) lies within the range, bounds included.
    pub fn contains(&self, date: &str) -> bool {
        self.from.as_str() <= date && date <= self.to.as_str()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Raw oracle answer for a reporting period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateRangeCandidate {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl ElicitedField for DateRange {
    type Candidate = DateRangeCandidate;

    fn field_name() -> &'static str {
        "date_range"
    }

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("identify_period")
            .with_field(FieldDescriptor::new(
                "date_from",
                FieldKind::Date,
                "First day of the reporting period",
            ))
            .with_field(FieldDescriptor::new(
                "date_to",
                FieldKind::Date,
                "Last day of the reporting period",
            ))
    }

    fn validate(candidate: DateRangeCandidate, _user_text: &str) -> ValidationOutcome<Self> {
        let from = candidate.date_from.filter(|s| !s.trim().is_empty());
        let to = candidate.date_to.filter(|s| !s.trim().is_empty());

        match (from, to) {
            (Some(from), Some(to)) => DateRange::parse(&from, &to).into(),
            (from, _) => {
                let missing = if from.is_none() { "date_from" } else { "date_to" };
                ValidationOutcome::Invalid(Rejection::incomplete(
                    format!("{} could not be determined", missing),
                    candidate.reasoning,
                ))
            }
        }
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}
