use crate::ContractViolation;
use intent_parser::{format_magnitude, Axis, Displacement, Sign, Utterance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spoken confirmation: echo, restatement in millimeters, question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationText(String);

impl ConfirmationText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Verify the text repeats `utterance`, then names every moving axis with
    /// its direction and magnitude, and ends with a question
    ///
    /// Wording is free; only those elements are checked, case-insensitively.
    /// Everything after the echo must carry the restatement on its own, so
    /// numbers or axes the operator spoke do not count.
    pub fn check(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> Result<(), ContractViolation> {
        let text = squash(&self.0);
        let echo = squash(echo_of(utterance.as_str()));

        let restatement = match text.find(&echo) {
            Some(at) => &text[at + echo.len()..],
            None => return Err(ContractViolation::MissingEcho),
        };

        for (axis, value) in displacement.moves() {
            let sign = Sign::of(value);
            let named = |label: Option<&str>| {
                axis_names(axis, label)
                    .iter()
                    .any(|n| restatement.contains(n.as_str()))
            };
            if !named(None) {
                return Err(ContractViolation::MissingAxis(axis));
            }
            if !named(Some(sign.label())) || named(Some(opposite(sign).label())) {
                return Err(ContractViolation::WrongDirection {
                    axis,
                    expected: sign,
                });
            }
            let expected = format_magnitude(value);
            if !contains_number(restatement, &expected) {
                return Err(ContractViolation::MissingMagnitude { axis, expected });
            }
        }

        if !self.0.trim_end().ends_with('?') {
            return Err(ContractViolation::MissingQuestion);
        }
        Ok(())
    }
}

/// "x-axis" and "x axis", optionally preceded by a direction word
fn axis_names(axis: Axis, sign: Option<&str>) -> [String; 2] {
    let prefix = sign.map(|s| format!("{s} ")).unwrap_or_default();
    [
        format!("{prefix}{}-axis", axis.label()),
        format!("{prefix}{} axis", axis.label()),
    ]
}

fn opposite(sign: Sign) -> Sign {
    match sign {
        Sign::Positive => Sign::Negative,
        Sign::Negative => Sign::Positive,
    }
}

impl fmt::Display for ConfirmationText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of an utterance a confirmation repeats: trimmed, without
/// closing punctuation
pub(crate) fn echo_of(utterance: &str) -> &str {
    utterance
        .trim()
        .trim_end_matches(&['.', '!', '?'][..])
        .trim_end()
}

fn squash(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `needle` appears as a whole number: "500" matches "500 mm" and "500.0 mm"
/// but not "1500"
fn contains_number(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + needle.len()..].chars().collect::<Vec<_>>();
        let clean_before = !before.is_some_and(|c| c.is_ascii_digit() || c == '.');
        let clean_after = match after.as_slice() {
            [] => true,
            [c, ..] if c.is_ascii_digit() => false,
            ['.', rest @ ..] => rest.iter().take_while(|c| c.is_ascii_digit()).all(|c| *c == '0'),
            _ => true,
        };
        clean_before && clean_after
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance() -> Utterance {
        Utterance::new("Shift along x-axis for 0.5 m")
    }

    #[test]
    fn accepts_free_wording() {
        let text = ConfirmationText::new(
            "I heard you said shift along x-axis for 0.5 m. I will move along positive x-axis for 500 mm. Does that sound good to you?",
        );
        assert_eq!(
            text.check(&utterance(), &Displacement::new(500.0, 0.0, 0.0)),
            Ok(())
        );

        let decimal = ConfirmationText::new(
            "I heard you said Shift along x-axis for 0.5 m! Moving 500.0 mm along the Positive X axis, OK?",
        );
        assert!(decimal
            .check(&utterance(), &Displacement::new(500.0, 0.0, 0.0))
            .is_ok());
    }

    #[test]
    fn reports_first_missing_element() {
        let d = Displacement::new(500.0, 0.0, 12.0);
        let cases = [
            ("I will move 500 mm on the x-axis?", ContractViolation::MissingEcho),
            (
                "I heard you said shift along x-axis for 0.5 m. 500 mm along positive x-axis and 12 mm up?",
                ContractViolation::MissingAxis(Axis::Z),
            ),
            (
                "I heard you said shift along x-axis for 0.5 m. 500 mm on x-axis and 12 mm on positive z-axis?",
                ContractViolation::WrongDirection {
                    axis: Axis::X,
                    expected: Sign::Positive,
                },
            ),
            (
                "I heard you said shift along x-axis for 0.5 m. 1500 mm on positive x-axis?",
                ContractViolation::MissingMagnitude {
                    axis: Axis::X,
                    expected: "500".to_string(),
                },
            ),
            (
                "I heard you said shift along x-axis for 0.5 m. 500 mm on positive x-axis, 12 mm on positive z-axis.",
                ContractViolation::MissingQuestion,
            ),
        ];
        for (text, expected) in cases {
            assert_eq!(
                ConfirmationText::new(text).check(&utterance(), &d),
                Err(expected),
                "{text}"
            );
        }
    }

    #[test]
    fn opposite_direction_is_rejected() {
        let left = Utterance::new("move to the left for 6 cm");
        let text = ConfirmationText::new(
            "I heard you said move to the left for 6 cm. I will move along positive x-axis for 60 mm. OK?",
        );
        assert_eq!(
            text.check(&left, &Displacement::new(-60.0, 0.0, 0.0)),
            Err(ContractViolation::WrongDirection {
                axis: Axis::X,
                expected: Sign::Negative,
            })
        );

        let both = ConfirmationText::new(
            "I heard you said move to the left for 6 cm. Negative x-axis or positive x-axis, 60 mm?",
        );
        assert!(both
            .check(&left, &Displacement::new(-60.0, 0.0, 0.0))
            .is_err());
    }

    #[test]
    fn echo_alone_does_not_restate() {
        let up = Utterance::new("move up along the z-axis for 36 mm");
        let d = Displacement::new(0.0, 0.0, 36.0);

        let no_number = ConfirmationText::new(
            "I heard you said move up along the z-axis for 36 mm. I will move along positive z-axis. OK?",
        );
        assert_eq!(
            no_number.check(&up, &d),
            Err(ContractViolation::MissingMagnitude {
                axis: Axis::Z,
                expected: "36".to_string(),
            })
        );

        let no_axis = ConfirmationText::new(
            "I heard you said move up along the z-axis for 36 mm. I will go up 36 mm. OK?",
        );
        assert_eq!(no_axis.check(&up, &d), Err(ContractViolation::MissingAxis(Axis::Z)));

        let wrong_way = ConfirmationText::new(
            "I heard you said move up along the z-axis for 36 mm. I will move down the z-axis. OK?",
        );
        assert!(wrong_way.check(&up, &d).is_err());
    }

    #[test]
    fn whole_number_matching() {
        assert!(contains_number("for 500 mm", "500"));
        assert!(contains_number("for 500.0 mm", "500"));
        assert!(!contains_number("for 1500 mm", "500"));
        assert!(!contains_number("for 500.5 mm", "500"));
        assert!(contains_number("for 304.8 mm", "304.8"));
    }
}
