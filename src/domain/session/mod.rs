//! Session domain module.
//!
//! A reporting session collects a period, site information, analytics data
//! and finally a report, all accumulated in one `SessionContext`.

mod context;

pub use context::{ConfirmedFields, SessionContext};
