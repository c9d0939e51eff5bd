//! Deterministic rule interpreter for natural-language movement commands

use crate::lexicon::{Cue, CueMatch, LexiconMatcher};
use crate::{
    Axis, Displacement, InterpretError, Interpretation, Interpreter, Lexicon, Result, Sign,
    Utterance,
};
use async_trait::async_trait;

/// Magnitude of every qualitative small motion, in millimeters
pub const SMALL_MOTION_MM: f64 = 1.0;

/// Reads utterances with the lexicon tables alone, no backend involved
///
/// Each clause contributes to the axes it names; when two clauses name the
/// same axis the later one wins.
#[derive(Debug, Clone)]
pub struct RuleInterpreter {
    matcher: LexiconMatcher,
}

impl RuleInterpreter {
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        Ok(Self {
            matcher: lexicon.compile()?,
        })
    }

    /// Resolve an utterance to a displacement
    pub fn resolve(&self, utterance: &str) -> Displacement {
        let text = self.matcher.normalize(utterance);
        let mut displacement = Displacement::ZERO;
        let mut pending = None;

        for clause in self.matcher.clauses(&text) {
            let cues = self.matcher.scan(clause);
            let moves = resolve_clause(&cues, &mut pending);
            tracing::debug!("clause {:?} -> {:?}", clause, moves);
            for (axis, value) in moves {
                displacement = displacement.with_component(axis, value);
            }
        }

        displacement
    }
}

/// Per-axis moves of one clause
///
/// `pending` carries a direction spoken without a distance ("move up, 5 mm")
/// into the next clause that has a distance but no direction.
fn resolve_clause(cues: &[CueMatch], pending: &mut Option<(Axis, Sign)>) -> Vec<(Axis, f64)> {
    let mut headings: Vec<(Axis, Sign, bool)> = Vec::new();
    let mut magnitudes: Vec<f64> = Vec::new();
    let mut small_motion = false;
    let mut previous: Option<Cue> = None;

    for m in cues {
        match m.cue {
            Cue::Direction(axis, sign) => {
                // "lower down", "lift up": one direction spoken twice
                if previous != Some(Cue::Direction(axis, sign)) {
                    headings.push((axis, sign, false));
                }
            }
            Cue::AxisName(axis, sign) => headings.push((axis, sign, true)),
            Cue::Marker => small_motion = true,
            Cue::Magnitude { value, unit } => magnitudes.push(unit.to_millimeters(value)),
        }
        previous = Some(m.cue);
    }

    // "along the z axis down 5 mm": the direction word sets the sign
    let worded: Vec<Axis> = headings
        .iter()
        .filter(|(_, _, axis_only)| !axis_only)
        .map(|(axis, _, _)| *axis)
        .collect();
    let directions: Vec<(Axis, Sign)> = headings
        .into_iter()
        .filter(|(axis, _, axis_only)| !axis_only || !worded.contains(axis))
        .map(|(axis, sign, _)| (axis, sign))
        .collect();

    if directions.is_empty() {
        let magnitude = if small_motion {
            Some(SMALL_MOTION_MM)
        } else {
            magnitudes.first().copied()
        };
        return match (magnitude, pending.take()) {
            (Some(value), Some((axis, sign))) => vec![(axis, sign.apply(value))],
            (None, carried) => {
                *pending = carried;
                Vec::new()
            }
            (Some(_), None) => Vec::new(),
        };
    }

    if small_motion {
        *pending = None;
        return directions
            .into_iter()
            .map(|(axis, sign)| (axis, sign.apply(SMALL_MOTION_MM)))
            .collect();
    }

    *pending = if magnitudes.is_empty() {
        directions.last().copied()
    } else {
        None
    };

    directions
        .into_iter()
        .zip(magnitudes)
        .map(|((axis, sign), value)| (axis, sign.apply(value)))
        .collect()
}

#[async_trait]
impl Interpreter for RuleInterpreter {
    async fn interpret(&self, utterance: &Utterance) -> Result<Interpretation> {
        if utterance.is_blank() {
            return Err(InterpretError::UnrecognizedInput(
                "empty utterance".to_string(),
            ));
        }
        Ok(Interpretation::local(self.resolve(utterance.as_str())))
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FEW_SHOT;

    fn interpreter() -> RuleInterpreter {
        RuleInterpreter::new(&Lexicon::default()).unwrap()
    }

    fn resolve(text: &str) -> Displacement {
        interpreter().resolve(text)
    }

    #[test]
    fn reproduces_every_few_shot_example() {
        let rules = interpreter();
        for example in FEW_SHOT {
            let got = rules.resolve(example.utterance);
            assert!(
                got.approx_eq(&example.displacement(), 1e-9),
                "{:?}: expected {}, got {}",
                example.utterance,
                example.displacement(),
                got
            );
        }
    }

    #[test]
    fn multi_clause_commands() {
        assert_eq!(
            resolve("move 2 cm up and 3 mm to the right"),
            Displacement::new(3.0, 0.0, 20.0)
        );
        assert_eq!(
            resolve("lower down for 70 centimeters and move to the left for 3 millimeters"),
            Displacement::new(-3.0, 0.0, -700.0)
        );
        assert_eq!(
            resolve("slide to the right for 40 mm, upward for 33 mm, and away for 54 mm"),
            Displacement::new(40.0, 54.0, 33.0)
        );
    }

    #[test]
    fn single_positive_x_cue_scales_by_unit() {
        for (text, expected) in [
            ("move right 2 mm", 2.0),
            ("move right 2 cm", 20.0),
            ("move right 2 m", 2000.0),
            ("move right 2 inches", 50.8),
            ("move right 2 ft", 609.6),
            ("move right 2", 2.0),
        ] {
            let d = resolve(text);
            assert!((d.delta_x - expected).abs() < 1e-9, "{text}: {d}");
            assert_eq!(d.delta_y, 0.0);
            assert_eq!(d.delta_z, 0.0);
        }
    }

    #[test]
    fn qualitative_marker_overrides_unit() {
        assert_eq!(
            resolve("raise it slightly, maybe 5 cm"),
            Displacement::new(0.0, 0.0, 1.0)
        );
        assert_eq!(
            resolve("go left a little bit by 3 meters"),
            Displacement::new(-1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn no_cue_is_zero_vector() {
        assert_eq!(resolve("hello there"), Displacement::ZERO);
        assert_eq!(resolve("move up"), Displacement::ZERO);
        assert_eq!(resolve("go 5 cm"), Displacement::ZERO);
    }

    #[test]
    fn later_clause_wins_on_same_axis() {
        assert_eq!(
            resolve("move up 5 mm and then down 2 mm"),
            Displacement::new(0.0, 0.0, -2.0)
        );
    }

    #[test]
    fn unmentioned_axes_stay_zero() {
        let d = resolve("forward 13mm");
        assert_eq!(d, Displacement::new(0.0, -13.0, 0.0));
    }

    #[test]
    fn direction_carries_into_following_distance() {
        assert_eq!(
            resolve("move the arm up, about 5 cm"),
            Displacement::new(0.0, 0.0, 50.0)
        );
    }

    #[test]
    fn spoken_numbers_and_axis_phrases() {
        assert_eq!(
            resolve("move twenty five millimeters in the negative z direction"),
            Displacement::new(0.0, 0.0, -25.0)
        );
        assert_eq!(
            resolve("go along the y axis for half a meter"),
            Displacement::ZERO.with_component(Axis::Y, 500.0)
        );
    }

    #[test]
    fn direction_word_sets_the_sign_of_a_named_axis() {
        assert_eq!(
            resolve("move along the z axis down 5 mm"),
            Displacement::new(0.0, 0.0, -5.0)
        );
        assert_eq!(
            resolve("go down 5 mm along the z axis"),
            Displacement::new(0.0, 0.0, -5.0)
        );
        assert_eq!(
            resolve("along the x axis for 5 mm"),
            Displacement::new(5.0, 0.0, 0.0)
        );
        assert_eq!(
            resolve("along the x axis 5 mm and up 3 mm"),
            Displacement::new(5.0, 0.0, 3.0)
        );
    }

    #[test]
    fn spoken_magnitudes_keep_their_scale() {
        assert_eq!(
            resolve("move up one hundred millimeters"),
            Displacement::new(0.0, 0.0, 100.0)
        );
        assert_eq!(
            resolve("move up two hundred mm"),
            Displacement::new(0.0, 0.0, 200.0)
        );
        assert_eq!(
            resolve("move up one and a half centimeters"),
            Displacement::new(0.0, 0.0, 15.0)
        );
        assert_eq!(
            resolve("move left two hundred and five mm and up 3 mm"),
            Displacement::new(-205.0, 0.0, 3.0)
        );
    }

    #[test]
    fn article_counts_as_one_unit() {
        assert_eq!(resolve("move up an inch"), Displacement::new(0.0, 0.0, 25.4));
        assert_eq!(
            resolve("move right a foot"),
            Displacement::new(304.8, 0.0, 0.0)
        );
        assert_eq!(
            resolve("raise it a centimeter"),
            Displacement::new(0.0, 0.0, 10.0)
        );
    }

    #[tokio::test]
    async fn blank_utterance_is_unrecognized() {
        let err = interpreter()
            .interpret(&Utterance::new("   "))
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn local_interpretation_has_no_usage() {
        let out = interpreter()
            .interpret(&Utterance::new("Move up 36mm"))
            .await
            .unwrap();
        assert_eq!(out.displacement, Displacement::new(0.0, 0.0, 36.0));
        assert!(out.usage.is_empty());
        assert!(out.reply.is_none());
    }
}
