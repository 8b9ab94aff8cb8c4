//! Analytics module - queries over the page-analytics record set and the
//! tables they produce.

mod query;
mod table;

pub use query::{Aggregation, PageQuery};
pub use table::Table;
