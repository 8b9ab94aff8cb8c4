//! Operator console adapters.

mod scripted_console;
mod stdio_console;

pub use scripted_console::{ConsoleOutput, ScriptedConsole};
pub use stdio_console::StdioConsole;
