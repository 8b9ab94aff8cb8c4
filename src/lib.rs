//! Site Insight - Interactive website reporting assistant
//!
//! This crate drives a single reporting session: the operator's free-text
//! request is turned into a confirmed reporting period and column set by a
//! bounded, oracle-assisted elicitation loop, the matching page analytics are
//! read from CSV exports, and a language model writes the final report.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
