//! Application layer - the oracle call, the elicitation loop and the
//! session phase handlers.
//!
//! - `oracle` - One structured or free-text exchange with the model
//! - `elicitation` - Bounded field elicitation loop
//! - `confirmation` - Operator yes/no gate
//! - `handlers` - Session phases and the driver that runs them

pub mod confirmation;
pub mod elicitation;
pub mod handlers;
pub mod oracle;
pub mod prompts;

pub use confirmation::ConfirmationGate;
pub use elicitation::{Elicited, ElicitationError, FieldElicitor, DEFAULT_MAX_ATTEMPTS};
pub use handlers::{
    AccessDataResult, FetchAccessDataError, FetchAccessDataHandler, FetchServiceInfoError,
    FetchServiceInfoHandler, GenerateReportError, GenerateReportHandler, IdentifyPeriodError,
    IdentifyPeriodHandler, IdentifyPeriodResult, RunSessionHandler, SessionError,
};
pub use oracle::{OracleError, StructuredAnswer, StructuredOracle};
