//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Oracle transports (OpenAI, scripted mock)
//! - `console` - Operator dialogue (terminal, scripted)
//! - `csv` - Analytics record sets read from CSV exports

pub mod ai;
pub mod console;
pub mod csv;

pub use ai::{MockAIProvider, MockError, OpenAIConfig, OpenAIProvider};
pub use console::{ConsoleOutput, ScriptedConsole, StdioConsole};
pub use self::csv::CsvTabularSource;
