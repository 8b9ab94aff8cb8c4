//! CSV-backed tabular source.

mod csv_source;

pub use csv_source::CsvTabularSource;
