//! Column selection value object.
//!
//! Columns are drawn from a fixed allow-list. Names returned by the oracle are
//! matched strictly (case-insensitive on the canonical name) first; only when
//! that yields nothing is the keyword table consulted, and after that the
//! words that ask for every column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

use super::{
    ElicitedField, FieldDescriptor, FieldKind, Rejection, SchemaDescriptor, ValidationOutcome,
};

/// Words asking for every column. Matched as substrings, except the
/// English word, which must stand alone.
const ALL_COLUMNS_WORDS: [&str; 4] = ["すべて", "全て", "全部", "全項目"];

/// True if `text` asks for every column.
fn asks_for_all(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ALL_COLUMNS_WORDS.iter().any(|w| lowered.contains(w))
        || lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == "all")
}

/// An allow-listed column of the page-analytics record set.
///
/// Variant order is display order; sets of columns sort the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Date,
    PageTitle,
    Url,
    Visits,
    BounceRate,
    AvgTimeOnPage,
    Conversions,
    ConversionRate,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Date,
        Column::PageTitle,
        Column::Url,
        Column::Visits,
        Column::BounceRate,
        Column::AvgTimeOnPage,
        Column::Conversions,
        Column::ConversionRate,
    ];

    /// Header name in the CSV and in queries.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::PageTitle => "ページタイトル",
            Column::Url => "URL",
            Column::Visits => "訪問数",
            Column::BounceRate => "直帰率",
            Column::AvgTimeOnPage => "平均滞在時間",
            Column::Conversions => "CV数",
            Column::ConversionRate => "CV率",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Column::Date => "day the row was recorded",
            Column::PageTitle => "title of the web page",
            Column::Url => "URL of the page",
            Column::Visits => "number of visits (aka PV, page views, access count)",
            Column::BounceRate => "share of visits that left immediately (aka bounce rate)",
            Column::AvgTimeOnPage => "average time on page, h:mm:ss",
            Column::Conversions => "number of conversions",
            Column::ConversionRate => "conversion rate (aka CVR)",
        }
    }

    /// Lower-case keywords that identify this column in free text.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Column::Date => &["日付", "日"],
            Column::PageTitle => &["タイトル", "title", "ページ名"],
            Column::Url => &["url", "リンク", "アドレス"],
            Column::Visits => &["訪問", "visit", "pv", "ページビュー", "アクセス"],
            Column::BounceRate => &["直帰", "bounce", "バウンス"],
            Column::AvgTimeOnPage => &["滞在", "time", "時間"],
            Column::Conversions => &["cv数", "コンバージョン数", "conversion", "コンバージョン", "成約"],
            Column::ConversionRate => &["cv率", "コンバージョン率", "cvr", "成約率"],
        }
    }

    /// Dimensions group rows; everything else is an aggregated metric.
    pub fn is_dimension(&self) -> bool {
        matches!(self, Column::Date | Column::PageTitle | Column::Url)
    }

    /// Strict lookup by canonical name, ignoring case and surrounding space.
    pub fn from_name(name: &str) -> Option<Column> {
        let wanted = name.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.name().to_lowercase() == wanted)
    }

    /// First keyword hit per column, scanning in allow-list order.
    pub fn match_keywords(text: &str) -> BTreeSet<Column> {
        let haystack = text.to_lowercase();
        Column::ALL
            .into_iter()
            .filter(|c| c.keywords().iter().any(|k| haystack.contains(k)))
            .collect()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-empty set of allow-listed columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSelection(BTreeSet<Column>);

impl ColumnSelection {
    /// Builds a selection from already-canonical columns, `None` if empty.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Option<Self> {
        let set: BTreeSet<Column> = columns.into_iter().collect();
        if set.is_empty() {
            None
        } else {
            Some(Self(set))
        }
    }

    /// Resolves oracle-provided names plus the operator's free text.
    ///
    /// Strict matches win; unknown extras alongside strict matches are dropped.
    /// With no strict match, keywords are looked up in the names and the text.
    /// If no keyword hits either, a request for everything selects every column.
    pub fn resolve(names: &[String], user_text: &str) -> Option<Self> {
        let (strict, unknown): (Vec<&String>, Vec<&String>) =
            names.iter().partition(|n| Column::from_name(n).is_some());

        if !strict.is_empty() {
            if !unknown.is_empty() {
                warn!(dropped = ?unknown, "Ignoring column names outside the allow-list");
            }
            return Self::new(strict.iter().filter_map(|n| Column::from_name(n)));
        }

        let mut found = Column::match_keywords(user_text);
        for name in names {
            found.extend(Column::match_keywords(name));
        }
        if found.is_empty() && (asks_for_all(user_text) || names.iter().any(|n| asks_for_all(n))) {
            return Self::new(Column::ALL);
        }
        Self::new(found)
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns().map(|c| c.name()).collect()
    }

    pub fn dimensions(&self) -> Vec<Column> {
        self.columns().filter(Column::is_dimension).collect()
    }

    pub fn metrics(&self) -> Vec<Column> {
        self.columns().filter(|c| !c.is_dimension()).collect()
    }
}

impl fmt::Display for ColumnSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

/// Raw oracle answer for a column selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColumnCandidate {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl ElicitedField for ColumnSelection {
    type Candidate = ColumnCandidate;

    fn field_name() -> &'static str {
        "columns"
    }

    fn schema() -> SchemaDescriptor {
        let allowed: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
        SchemaDescriptor::new("identify_columns").with_field(FieldDescriptor::new(
            "columns",
            FieldKind::TextList,
            format!("Column names, only from: {}", allowed.join(", ")),
        ))
    }

    fn validate(candidate: ColumnCandidate, user_text: &str) -> ValidationOutcome<Self> {
        let names = candidate.columns.unwrap_or_default();
        match ColumnSelection::resolve(&names, user_text) {
            Some(selection) => ValidationOutcome::Valid(selection),
            None => {
                let allowed: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
                let reason = if names.is_empty() {
                    format!("no column identified; available columns: {}", allowed.join(", "))
                } else {
                    format!(
                        "{} are not available columns; available columns: {}",
                        names.join(", "),
                        allowed.join(", ")
                    )
                };
                ValidationOutcome::Invalid(Rejection::incomplete(reason, candidate.reasoning))
            }
        }
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}
