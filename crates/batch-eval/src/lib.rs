//! Batch evaluation over prompt tables
//!
//! Runs a whole column of utterances through an interpreter, or a column of
//! utterances plus their displacements through a composer, appends the results
//! as a `Completion` column and reports token usage, timing and, when expected
//! answers are present, accuracy.

mod error;
mod metrics;
mod runner;
mod table;

pub use error::{BatchError, Result};
pub use metrics::{UsageCounters, UsageMetrics};
pub use runner::{
    accuracy, confirm_table, interpret_table, run_confirmations, run_interpretations, Accuracy,
    AverageUsage, BatchOptions, BatchReport, ItemResult, ACCURACY_TOLERANCE, COMPLETION_COLUMN,
};
pub use table::{completion_path, Table, COMPLETION_SUFFIX};

/// Initialize batch evaluation
pub fn init() -> Result<()> {
    tracing::info!("Initializing batch evaluation");
    Ok(())
}
