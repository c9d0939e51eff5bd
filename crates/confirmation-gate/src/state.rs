//! Gate states and the transitions between them

use crate::{GateError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// Waiting for an utterance to interpret
    AwaitingInterpretation,
    /// A displacement was read back; waiting for yes or no
    AwaitingConfirmation,
    /// Confirmed; the displacement goes to the actuator
    Execute,
    /// Not understood or not confirmed; a fresh utterance is needed
    Retry,
    /// Retry budget spent, nothing executed
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateEvent {
    Interpreted,
    NotUnderstood,
    Confirmed,
    Rejected,
    RetryAvailable,
    BudgetExhausted,
}

impl GateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::Execute | GateState::Aborted)
    }

    pub fn next(self, event: GateEvent) -> Result<GateState> {
        use GateEvent::*;
        use GateState::*;

        match (self, event) {
            (AwaitingInterpretation, Interpreted) => Ok(AwaitingConfirmation),
            (AwaitingInterpretation, NotUnderstood) => Ok(Retry),
            (AwaitingConfirmation, Confirmed) => Ok(Execute),
            (AwaitingConfirmation, Rejected) => Ok(Retry),
            (Retry, RetryAvailable) => Ok(AwaitingInterpretation),
            (Retry, BudgetExhausted) => Ok(Aborted),
            (from, event) => Err(GateError::InvalidTransition { from, event }),
        }
    }
}

/// One recorded step of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: GateState,
    pub event: GateEvent,
    pub to: GateState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let s = GateState::AwaitingInterpretation
            .next(GateEvent::Interpreted)
            .unwrap();
        assert_eq!(s, GateState::AwaitingConfirmation);
        let s = s.next(GateEvent::Confirmed).unwrap();
        assert_eq!(s, GateState::Execute);
        assert!(s.is_terminal());
    }

    #[test]
    fn retry_loops_or_aborts() {
        let retry = GateState::AwaitingConfirmation
            .next(GateEvent::Rejected)
            .unwrap();
        assert_eq!(
            retry.next(GateEvent::RetryAvailable).unwrap(),
            GateState::AwaitingInterpretation
        );
        assert_eq!(
            retry.next(GateEvent::BudgetExhausted).unwrap(),
            GateState::Aborted
        );
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for event in [GateEvent::Interpreted, GateEvent::RetryAvailable] {
            assert!(GateState::Execute.next(event).is_err());
            assert!(GateState::Aborted.next(event).is_err());
        }
    }

    #[test]
    fn confirmation_needs_an_interpretation_first() {
        assert!(matches!(
            GateState::AwaitingInterpretation.next(GateEvent::Confirmed),
            Err(GateError::InvalidTransition { .. })
        ));
    }
}
