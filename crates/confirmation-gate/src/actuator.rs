use crate::Result;
use async_trait::async_trait;
use intent_parser::Displacement;
use parking_lot::Mutex;

/// Receives confirmed displacements; the motion controller sits behind this
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn execute(&self, displacement: &Displacement) -> Result<()>;
}

/// Dry-run actuator: logs each displacement and keeps a history
#[derive(Debug, Default)]
pub struct LoggingActuator {
    history: Mutex<Vec<Displacement>>,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Displacement> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl Actuator for LoggingActuator {
    async fn execute(&self, displacement: &Displacement) -> Result<()> {
        tracing::info!("Executing displacement (dry run): {}", displacement);
        self.history.lock().push(*displacement);
        Ok(())
    }
}
