//! Page-analytics query built from the confirmed period and columns.

use crate::domain::elicitation::{Column, ColumnSelection, DateRange};

/// How a metric column is folded within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Integer counts are summed.
    Sum,
    /// Percent strings (`35%`) are averaged.
    AvgPercent,
    /// `h:mm:ss` durations are averaged in seconds.
    AvgDuration,
}

impl Aggregation {
    pub fn for_column(column: Column) -> Option<Aggregation> {
        match column {
            Column::Visits | Column::Conversions => Some(Aggregation::Sum),
            Column::BounceRate | Column::ConversionRate => Some(Aggregation::AvgPercent),
            Column::AvgTimeOnPage => Some(Aggregation::AvgDuration),
            Column::Date | Column::PageTitle | Column::Url => None,
        }
    }

    fn sql(&self, column: Column) -> String {
        let name = column.name();
        match self {
            Aggregation::Sum => format!("SUM({name}) AS {name}"),
            Aggregation::AvgPercent => {
                format!("AVG(CAST(REPLACE({name}, '%', '') AS REAL)) AS {name}")
            }
            Aggregation::AvgDuration => format!("AVG(TIME_TO_SEC({name})) AS {name}"),
        }
    }
}

/// Filter/aggregate request against the page-analytics record set.
///
/// Selected dimensions form the group key; a selection without any dimension
/// is grouped by page title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    range: DateRange,
    columns: ColumnSelection,
}

impl PageQuery {
    pub fn new(range: DateRange, columns: ColumnSelection) -> Self {
        Self { range, columns }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn columns(&self) -> &ColumnSelection {
        &self.columns
    }

    pub fn group_by(&self) -> Vec<Column> {
        let dimensions = self.columns.dimensions();
        if dimensions.is_empty() {
            vec![Column::PageTitle]
        } else {
            dimensions
        }
    }

    pub fn metrics(&self) -> Vec<Column> {
        self.columns.metrics()
    }

    /// Output column order: group key first, then metrics.
    pub fn output_columns(&self) -> Vec<Column> {
        let mut out = self.group_by();
        out.extend(self.metrics());
        out
    }

    /// SQL text equivalent of this query, shown next to the results.
    pub fn to_sql(&self) -> String {
        let group_by: Vec<&str> = self.group_by().iter().map(|c| c.name()).collect();
        let mut select: Vec<String> = group_by.iter().map(|s| s.to_string()).collect();
        for metric in self.metrics() {
            if let Some(agg) = Aggregation::for_column(metric) {
                select.push(agg.sql(metric));
            }
        }

        format!(
            "SELECT {} FROM df WHERE date BETWEEN '{}' AND '{}' GROUP BY {} ORDER BY {};",
            select.join(", "),
            self.range.from(),
            self.range.to(),
            group_by.join(", "),
            group_by.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(columns: &[Column]) -> PageQuery {
        PageQuery::new(
            DateRange::parse("2025-02-01", "2025-02-28").unwrap(),
            ColumnSelection::new(columns.iter().copied()).unwrap(),
        )
    }

    #[test]
    fn metrics_only_groups_by_page_title() {
        let q = query(&[Column::Visits, Column::ConversionRate]);
        assert_eq!(q.group_by(), vec![Column::PageTitle]);
        assert_eq!(
            q.output_columns(),
            vec![Column::PageTitle, Column::Visits, Column::ConversionRate]
        );
    }

    #[test]
    fn selected_dimensions_form_the_key() {
        let q = query(&[Column::Url, Column::Date, Column::Conversions]);
        assert_eq!(q.group_by(), vec![Column::Date, Column::Url]);
    }

    #[test]
    fn sql_mentions_period_and_aggregates() {
        let sql = query(&[Column::Date, Column::Visits, Column::BounceRate]).to_sql();
        assert_eq!(
            sql,
            "SELECT date, SUM(訪問数) AS 訪問数, AVG(CAST(REPLACE(直帰率, '%', '') AS REAL)) AS 直帰率 \
             FROM df WHERE date BETWEEN '2025-02-01' AND '2025-02-28' GROUP BY date ORDER BY date;"
        );
    }

    #[test]
    fn dimensions_have_no_aggregation() {
        assert_eq!(Aggregation::for_column(Column::Url), None);
        assert_eq!(
            Aggregation::for_column(Column::AvgTimeOnPage),
            Some(Aggregation::AvgDuration)
        );
    }
}
