//! Application handlers.
//!
//! One handler per session phase, plus the driver that runs them in order.

mod fetch_access_data;
mod fetch_service_info;
mod generate_report;
mod identify_period;
mod run_session;

pub use fetch_access_data::{AccessDataResult, FetchAccessDataError, FetchAccessDataHandler};
pub use fetch_service_info::{FetchServiceInfoError, FetchServiceInfoHandler};
pub use generate_report::{GenerateReportError, GenerateReportHandler};
pub use identify_period::{IdentifyPeriodError, IdentifyPeriodHandler, IdentifyPeriodResult};
pub use run_session::{RunSessionHandler, SessionError};

use crate::ports::{OperatorConsole, OperatorError};

/// Asks `question` until a non-blank line comes back, at most `max_tries`
/// times. `None` when every answer was blank.
pub(crate) async fn read_request(
    console: &mut dyn OperatorConsole,
    question: &str,
    max_tries: u32,
) -> Result<Option<String>, OperatorError> {
    for _ in 0..max_tries.max(1) {
        let answer = console.prompt_line(question).await?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(Some(answer.to_string()));
        }
        tracing::debug!(question, "Blank answer, asking again");
    }
    Ok(None)
}
