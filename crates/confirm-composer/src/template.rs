//! Deterministic confirmation wording

use crate::text::echo_of;
use crate::{Composer, Confirmation, ConfirmationText, Result};
use async_trait::async_trait;
use intent_parser::{format_magnitude, Displacement, Sign, Utterance};

/// Question closing a confirmation that moves the arm
pub const MOVE_QUESTION: &str = "Does that sound good to you?";
/// Question closing a confirmation that leaves the arm in place
pub const STAY_QUESTION: &str = "Is that OK?";

/// Renders confirmations from a fixed sentence pattern
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateComposer;

impl TemplateComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, utterance: &Utterance, displacement: &Displacement) -> ConfirmationText {
        let echo = echo_phrase(utterance.as_str());

        let legs: Vec<String> = displacement
            .moves()
            .map(|(axis, value)| {
                format!(
                    "{} {} for {} mm",
                    Sign::of(value).label(),
                    axis,
                    format_magnitude(value)
                )
            })
            .collect();

        let text = if legs.is_empty() {
            format!("I heard you said {echo}. I will not move. {STAY_QUESTION}")
        } else {
            format!(
                "I heard you said {echo}. I will move along {}. {MOVE_QUESTION}",
                join_legs(&legs)
            )
        };
        ConfirmationText::new(text)
    }
}

/// "a", "a and b", "a, b, and c"
fn join_legs(legs: &[String]) -> String {
    match legs {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Utterance as repeated mid-sentence: "Move up 36mm." becomes "move up 36mm"
fn echo_phrase(utterance: &str) -> String {
    let echo = echo_of(utterance);
    let mut chars = echo.chars();
    match chars.next() {
        // Acronyms and "I" keep their case
        Some(first)
            if first.is_uppercase()
                && !echo.starts_with("I ")
                && !chars.clone().next().is_some_and(char::is_uppercase) =>
        {
            first.to_lowercase().chain(chars).collect()
        }
        _ => echo.to_string(),
    }
}

#[async_trait]
impl Composer for TemplateComposer {
    async fn compose(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> Result<Confirmation> {
        Ok(Confirmation::local(self.render(utterance, displacement)))
    }

    fn name(&self) -> &str {
        "template"
    }
}
