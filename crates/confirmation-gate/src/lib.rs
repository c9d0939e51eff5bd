//! Confirmation Gate
//!
//! Guards the actuator: an interpreted displacement is read back to the
//! operator and only executed after an explicit yes. Anything else sends the
//! interaction back for a fresh utterance, within a bounded retry budget.
//!
//! ```text
//! AwaitingInterpretation --Interpreted--> AwaitingConfirmation --Confirmed--> Execute
//!        |  NotUnderstood                        | Rejected
//!        v                                       v
//!      Retry <-----------------------------------+
//!        |--RetryAvailable--> AwaitingInterpretation
//!        '--BudgetExhausted--> Aborted
//! ```

mod actuator;
mod channel;
mod classifier;
mod error;
mod gate;
mod state;

pub use actuator::{Actuator, LoggingActuator};
pub use channel::{ConsoleChannel, Line, OperatorChannel, ScriptedChannel};
pub use classifier::{Response, ResponseClassifier};
pub use error::{GateError, Result};
pub use gate::{
    ConfirmationGate, GatePolicy, SessionOutcome, SessionReport, ASK_AGAIN, NOT_UNDERSTOOD,
};
pub use state::{GateEvent, GateState, Transition};

/// Initialize the confirmation gate
pub fn init() -> Result<()> {
    tracing::info!("Initializing Confirmation Gate");
    Ok(())
}
