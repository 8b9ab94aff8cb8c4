//! CSV tabular source - filters and aggregates the analytics CSV exports.
//!
//! Page-analytics rows are grouped in memory; the files are small exports
//! and are re-read on every query so edits show up without a restart.

use csv::{ReaderBuilder, StringRecord};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::analytics::{Aggregation, PageQuery, Table};
use crate::domain::elicitation::{canonicalize, Column};
use crate::domain::foundation::SiteId;
use crate::ports::{TabularError, TabularSource};

const SITE_ID: &str = "site_id";
const SERVICE: &str = "service";
const OVERVIEW: &str = "overview";

/// Tabular source backed by two CSV files.
#[derive(Debug, Clone)]
pub struct CsvTabularSource {
    landing_page_csv: PathBuf,
    site_csv: PathBuf,
}

impl CsvTabularSource {
    pub fn new(landing_page_csv: impl Into<PathBuf>, site_csv: impl Into<PathBuf>) -> Self {
        Self {
            landing_page_csv: landing_page_csv.into(),
            site_csv: site_csv.into(),
        }
    }

    pub fn landing_page_csv(&self) -> &Path {
        &self.landing_page_csv
    }

    pub fn site_csv(&self) -> &Path {
        &self.site_csv
    }
}

/// A CSV file loaded with its header index.
struct LoadedCsv<'a> {
    path: &'a Path,
    index: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl<'a> LoadedCsv<'a> {
    fn read(path: &'a Path) -> Result<Self, TabularError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TabularError::MissingFile {
                path: path.to_path_buf(),
            },
            _ => TabularError::decode(path, e.to_string()),
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let index = reader
            .headers()
            .map_err(|e| TabularError::decode(path, e.to_string()))?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_string(), i))
            .collect();

        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TabularError::decode(path, e.to_string()))?;

        Ok(Self {
            path,
            index,
            records,
        })
    }

    fn column(&self, name: &str) -> Result<usize, TabularError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TabularError::unknown_column(self.path, name))
    }
}

/// Running fold of one metric within a group.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    total: f64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn render(&self, aggregation: Aggregation) -> String {
        if self.count == 0 {
            return String::new();
        }
        let mean = self.total / f64::from(self.count);
        match aggregation {
            Aggregation::Sum => format_number(self.total),
            Aggregation::AvgPercent => format!("{:.2}%", mean),
            Aggregation::AvgDuration => format_duration(mean.round() as u64),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn format_duration(total_secs: u64) -> String {
    format!(
        "{}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

/// Parses `h:mm:ss` or `mm:ss` into seconds.
fn parse_duration(raw: &str) -> Option<f64> {
    let parts: Vec<u64> = raw
        .split(':')
        .map(|p| p.trim().parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let secs = match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        _ => return None,
    };
    Some(secs as f64)
}

fn parse_metric(aggregation: Aggregation, raw: &str) -> Option<f64> {
    match aggregation {
        Aggregation::Sum => raw.replace(',', "").parse().ok(),
        Aggregation::AvgPercent => raw.trim_end_matches('%').trim().parse().ok(),
        Aggregation::AvgDuration => parse_duration(raw),
    }
}

impl TabularSource for CsvTabularSource {
    fn query_pages(&self, query: &PageQuery) -> Result<Table, TabularError> {
        let csv = LoadedCsv::read(&self.landing_page_csv)?;
        let path = csv.path;

        let date_idx = csv.column(Column::Date.name())?;
        let key_columns = query.group_by();
        let key_idx = key_columns
            .iter()
            .map(|c| csv.column(c.name()))
            .collect::<Result<Vec<_>, _>>()?;
        let metrics: Vec<(Aggregation, usize)> = query
            .metrics()
            .into_iter()
            .filter_map(|c| Aggregation::for_column(c).map(|a| (a, c)))
            .map(|(a, c)| csv.column(c.name()).map(|idx| (a, idx)))
            .collect::<Result<_, _>>()?;

        let mut groups: BTreeMap<Vec<String>, Vec<Accumulator>> = BTreeMap::new();

        for (line, record) in csv.records.iter().enumerate() {
            let raw_date = record.get(date_idx).unwrap_or_default();
            let date = canonicalize(Column::Date.name(), raw_date).map_err(|e| {
                TabularError::decode(path, format!("row {}: {}", line + 2, e))
            })?;
            if !query.range().contains(&date) {
                continue;
            }

            let key: Vec<String> = key_columns
                .iter()
                .zip(&key_idx)
                .map(|(column, &idx)| match column {
                    Column::Date => date.clone(),
                    _ => record.get(idx).unwrap_or_default().to_string(),
                })
                .collect();

            let accumulators = groups
                .entry(key)
                .or_insert_with(|| vec![Accumulator::default(); metrics.len()]);

            for (acc, &(aggregation, idx)) in accumulators.iter_mut().zip(&metrics) {
                let raw = record.get(idx).unwrap_or_default();
                if raw.is_empty() {
                    continue;
                }
                let value = parse_metric(aggregation, raw).ok_or_else(|| {
                    TabularError::decode(
                        path,
                        format!("row {}: cannot read '{}' as a number", line + 2, raw),
                    )
                })?;
                acc.add(value);
            }
        }

        let mut table = Table::new(query.output_columns().iter().map(|c| c.name()));
        for (key, accumulators) in groups {
            let mut row = key;
            row.extend(
                accumulators
                    .iter()
                    .zip(&metrics)
                    .map(|(acc, &(aggregation, _))| acc.render(aggregation)),
            );
            table.push_row(row);
        }

        tracing::debug!(
            path = %path.display(),
            scanned = csv.records.len(),
            groups = table.rows().len(),
            "Page query executed"
        );

        Ok(table)
    }

    fn query_site(&self, site_id: &SiteId) -> Result<Table, TabularError> {
        let csv = LoadedCsv::read(&self.site_csv)?;
        let id_idx = csv.column(SITE_ID)?;
        let service_idx = csv.column(SERVICE)?;
        let overview_idx = csv.column(OVERVIEW)?;

        let mut table = Table::new([SERVICE, OVERVIEW]);
        for record in csv
            .records
            .iter()
            .filter(|r| r.get(id_idx) == Some(site_id.as_str()))
        {
            table.push_row(vec![
                record.get(service_idx).unwrap_or_default().to_string(),
                record.get(overview_idx).unwrap_or_default().to_string(),
            ]);
        }

        if table.is_empty() {
            return Err(TabularError::SiteNotFound(site_id.to_string()));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::elicitation::{ColumnSelection, DateRange};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PAGES: &str = "\
date,ページタイトル,URL,訪問数,直帰率,平均滞在時間,CV数,CV率
2025-02-01,トップ,/,100,40%,0:01:00,2,2%
2025-02-01,料金,/price,50,20%,0:02:00,5,10%
2025-02-15,トップ,/,300,60%,0:03:00,4,1%
2025-03-01,トップ,/,999,99%,0:09:00,9,9%
";

    const SITES: &str = "\
site_id,service,overview
111,Acme CRM,\"Cloud CRM, for SMBs\"
222,Other,Something else
";

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn source(pages: &NamedTempFile, sites: &NamedTempFile) -> CsvTabularSource {
        CsvTabularSource::new(pages.path(), sites.path())
    }

    fn february(columns: &[Column]) -> PageQuery {
        PageQuery::new(
            DateRange::parse("2025-02-01", "2025-02-28").unwrap(),
            ColumnSelection::new(columns.iter().copied()).unwrap(),
        )
    }

    mod query_pages {
        use super::*;

        #[test]
        fn sums_counts_grouped_by_page_title() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let table = source(&pages, &sites)
                .query_pages(&february(&[Column::Visits, Column::Conversions]))
                .unwrap();

            assert_eq!(table.headers(), &["ページタイトル", "訪問数", "CV数"]);
            assert_eq!(
                table.rows(),
                &[
                    vec!["トップ".to_string(), "400".into(), "6".into()],
                    vec!["料金".to_string(), "50".into(), "5".into()],
                ]
            );
        }

        #[test]
        fn averages_percentages_and_durations() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let table = source(&pages, &sites)
                .query_pages(&february(&[
                    Column::PageTitle,
                    Column::BounceRate,
                    Column::AvgTimeOnPage,
                ]))
                .unwrap();

            assert_eq!(
                table.rows()[0],
                vec!["トップ".to_string(), "50.00%".into(), "0:02:00".into()]
            );
        }

        #[test]
        fn groups_by_every_selected_dimension() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let table = source(&pages, &sites)
                .query_pages(&february(&[Column::Date, Column::Visits]))
                .unwrap();

            assert_eq!(
                table.rows(),
                &[
                    vec!["2025-02-01".to_string(), "150".into()],
                    vec!["2025-02-15".to_string(), "300".into()],
                ]
            );
        }

        #[test]
        fn period_without_rows_yields_empty_table() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let query = PageQuery::new(
                DateRange::parse("2024-01-01", "2024-01-31").unwrap(),
                ColumnSelection::new([Column::Visits]).unwrap(),
            );

            let table = source(&pages, &sites).query_pages(&query).unwrap();

            assert!(table.is_empty());
        }

        #[test]
        fn missing_column_is_reported() {
            let pages = write("date,ページタイトル,訪問数\n2025-02-01,トップ,1\n");
            let sites = write(SITES);

            let err = source(&pages, &sites)
                .query_pages(&february(&[Column::ConversionRate]))
                .unwrap_err();

            assert!(matches!(err, TabularError::UnknownColumn { column, .. } if column == "CV率"));
        }

        #[test]
        fn unreadable_metric_is_a_decode_error() {
            let pages = write("date,ページタイトル,訪問数\n2025-02-01,トップ,many\n");
            let sites = write(SITES);

            let err = source(&pages, &sites)
                .query_pages(&february(&[Column::Visits]))
                .unwrap_err();

            assert!(matches!(err, TabularError::Decode { .. }));
        }

        #[test]
        fn missing_file_is_reported() {
            let sites = write(SITES);
            let src = CsvTabularSource::new("/nonexistent/landingpage_data.csv", sites.path());

            let err = src.query_pages(&february(&[Column::Visits])).unwrap_err();

            assert!(matches!(err, TabularError::MissingFile { .. }));
        }
    }

    mod query_site {
        use super::*;

        #[test]
        fn returns_service_and_overview() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let table = source(&pages, &sites)
                .query_site(&SiteId::new("111").unwrap())
                .unwrap();

            assert_eq!(table.headers(), &["service", "overview"]);
            assert_eq!(
                table.rows(),
                &[vec!["Acme CRM".to_string(), "Cloud CRM, for SMBs".into()]]
            );
        }

        #[test]
        fn unknown_site_is_an_error() {
            let (pages, sites) = (write(PAGES), write(SITES));
            let err = source(&pages, &sites)
                .query_site(&SiteId::new("999").unwrap())
                .unwrap_err();

            assert!(matches!(err, TabularError::SiteNotFound(id) if id == "999"));
        }
    }

    #[test]
    fn durations_parse_with_and_without_hours() {
        assert_eq!(parse_duration("1:02:03"), Some(3723.0));
        assert_eq!(parse_duration("02:03"), Some(123.0));
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(format_duration(3723), "1:02:03");
    }
}
