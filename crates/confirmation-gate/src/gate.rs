//! The interaction loop: interpret, read back, wait for yes, then execute

use crate::{
    Actuator, GateError, GateEvent, GateState, OperatorChannel, Response, ResponseClassifier,
    Result, Transition,
};
use confirm_composer::Composer;
use intent_parser::{Displacement, Interpreter};
use llm_backend::TokenUsage;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const NOT_UNDERSTOOD: &str = "Sorry, I did not understand that.";
pub const ASK_AGAIN: &str = "Okay, please tell me the command again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Utterances heard before giving up, at least 1
    pub max_attempts: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl GatePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GateError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Executed(Displacement),
    Aborted,
}

/// What happened during one interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub interaction_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub attempts: u32,
    pub outcome: SessionOutcome,
    pub transitions: Vec<Transition>,
    pub usage: TokenUsage,
}

impl SessionReport {
    pub fn executed(&self) -> Option<Displacement> {
        match self.outcome {
            SessionOutcome::Executed(d) => Some(d),
            SessionOutcome::Aborted => None,
        }
    }
}

/// Nothing reaches the actuator without an explicit yes
pub struct ConfirmationGate<I, C, A> {
    interpreter: I,
    composer: C,
    actuator: A,
    classifier: ResponseClassifier,
    policy: GatePolicy,
}

struct Session {
    report: SessionReport,
    state: GateState,
}

impl Session {
    fn new() -> Self {
        Self {
            report: SessionReport {
                interaction_id: Uuid::new_v4(),
                started_at: OffsetDateTime::now_utc(),
                attempts: 0,
                outcome: SessionOutcome::Aborted,
                transitions: Vec::new(),
                usage: TokenUsage::default(),
            },
            state: GateState::AwaitingInterpretation,
        }
    }

    fn advance(&mut self, event: GateEvent) -> Result<()> {
        let to = self.state.next(event)?;
        tracing::info!(
            "[{}] {:?} --{:?}--> {:?}",
            self.report.interaction_id,
            self.state,
            event,
            to
        );
        self.report.transitions.push(Transition {
            from: self.state,
            event,
            to,
        });
        self.state = to;
        Ok(())
    }
}

impl<I, C, A> ConfirmationGate<I, C, A>
where
    I: Interpreter,
    C: Composer,
    A: Actuator,
{
    pub fn new(interpreter: I, composer: C, actuator: A, policy: GatePolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            interpreter,
            composer,
            actuator,
            classifier: ResponseClassifier::default(),
            policy,
        })
    }

    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Run one interaction to a terminal state
    ///
    /// Unintelligible or unconfirmed commands are retried with a fresh
    /// utterance until the policy's budget runs out. An unreachable backend
    /// or a broken channel ends the session with an error.
    pub async fn run(&self, channel: &mut dyn OperatorChannel) -> Result<SessionReport> {
        let mut session = Session::new();
        tracing::info!(
            "Starting interaction {} ({} attempts, interpreter: {}, composer: {})",
            session.report.interaction_id,
            self.policy.max_attempts,
            self.interpreter.name(),
            self.composer.name()
        );

        loop {
            session.report.attempts += 1;
            if let Some(displacement) = self.attempt(&mut session, channel).await? {
                session.report.outcome = SessionOutcome::Executed(displacement);
                return Ok(session.report);
            }

            if session.report.attempts >= self.policy.max_attempts {
                session.advance(GateEvent::BudgetExhausted)?;
                channel
                    .notify(&format!(
                        "I could not get a confirmed command after {} attempts. Nothing was moved.",
                        session.report.attempts
                    ))
                    .await?;
                tracing::warn!(
                    "Interaction {} aborted after {} attempts",
                    session.report.interaction_id,
                    session.report.attempts
                );
                return Ok(session.report);
            }
            session.advance(GateEvent::RetryAvailable)?;
        }
    }

    /// One pass from `AwaitingInterpretation` to `Execute` or `Retry`
    async fn attempt(
        &self,
        session: &mut Session,
        channel: &mut dyn OperatorChannel,
    ) -> Result<Option<Displacement>> {
        let utterance = channel.capture_utterance().await?;

        let interpretation = match self.interpreter.interpret(&utterance).await {
            Ok(interpretation) => interpretation,
            Err(e) if e.is_recoverable() => {
                tracing::debug!("Not understood: {}", e);
                session.advance(GateEvent::NotUnderstood)?;
                channel.notify(NOT_UNDERSTOOD).await?;
                return Ok(None);
            }
            Err(e) => return Err(GateError::Interpret(e)),
        };
        session.report.usage += interpretation.usage;
        session.advance(GateEvent::Interpreted)?;

        let displacement = interpretation.displacement;
        let confirmation = self.composer.compose(&utterance, &displacement).await?;
        session.report.usage += confirmation.usage;
        channel.present_confirmation(&confirmation.text).await?;

        let answer = channel.capture_response().await?;
        match self.classifier.classify(&answer) {
            Response::Confirmed => {
                session.advance(GateEvent::Confirmed)?;
                self.actuator.execute(&displacement).await?;
                channel.notify("Moving now.").await?;
                Ok(Some(displacement))
            }
            Response::Rejected => {
                tracing::debug!("Answer {:?} is not a confirmation", answer);
                session.advance(GateEvent::Rejected)?;
                channel.notify(ASK_AGAIN).await?;
                Ok(None)
            }
        }
    }
}
