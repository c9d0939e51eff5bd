//! Instruction text and worked examples sent to language backends

use crate::{Axis, Displacement, Lexicon, Sign, UnitToken};
use std::fmt::Write;

/// One worked example shown to the backend before the live utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FewShot {
    pub utterance: &'static str,
    pub delta: [f64; 3],
}

impl FewShot {
    pub fn displacement(&self) -> Displacement {
        let [x, y, z] = self.delta;
        Displacement::new(x, y, z)
    }

    /// Assistant turn in the reply grammar
    pub fn reply(&self) -> String {
        self.displacement().to_string()
    }
}

pub const FEW_SHOT: &[FewShot] = &[
    FewShot {
        utterance: "Move up 36mm",
        delta: [0.0, 0.0, 36.0],
    },
    FewShot {
        utterance: "Move backwards a lil bit",
        delta: [0.0, 1.0, 0.0],
    },
    FewShot {
        utterance: "Shift left for 54cm",
        delta: [-540.0, 0.0, 0.0],
    },
    FewShot {
        utterance: "lower down for 70 centimeters and move to the left for 3 millimeters",
        delta: [-3.0, 0.0, -700.0],
    },
    FewShot {
        utterance: "lift the arm for 33 mm and forward for 13mm",
        delta: [0.0, -13.0, 33.0],
    },
    FewShot {
        utterance: "move closer for 1 ft",
        delta: [0.0, -304.8, 0.0],
    },
    FewShot {
        utterance: "Move away for 16 cm",
        delta: [0.0, 160.0, 0.0],
    },
    FewShot {
        utterance: "Slide in the negative Y direction for 23cm",
        delta: [0.0, -230.0, 0.0],
    },
    FewShot {
        utterance: "Shift along x-axis for 0.5 m",
        delta: [500.0, 0.0, 0.0],
    },
    FewShot {
        utterance: "move towards me a little bit, move to the left for 6 cm, and lower for 12 mm",
        delta: [-60.0, -1.0, -12.0],
    },
    FewShot {
        utterance: "slide to the right for 40 mm, upward for 33 mm, and away for 54 mm",
        delta: [40.0, 54.0, 33.0],
    },
];

fn quoted(phrases: &[&str]) -> String {
    phrases
        .iter()
        .map(|p| format!("'{}'", p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn axis_rule(lexicon: &Lexicon, axis: Axis) -> String {
    let kind = match axis {
        Axis::Z => "Vertical",
        _ => "Horizontal",
    };
    let field = format!("delta_{}", axis.label());
    format!(
        "   - {kind} ({axis}): If the user mentions {pos} or similar, set {field} to a positive value. \
         If the user mentions {neg} or similar, set {field} to a negative value.",
        pos = quoted(&lexicon.phrases(axis, Sign::Positive)),
        neg = quoted(&lexicon.phrases(axis, Sign::Negative)),
    )
}

/// System instruction for the interpretation backend, rendered from the
/// lexicon so the backend and the rule interpreter share one vocabulary
pub fn build_system_prompt(lexicon: &Lexicon) -> String {
    let mut out = String::from(
        "Interpret the user's input to control the robot's movement in millimeters \
         along the x, y, and z axes. The operator stands facing the robot. \
         Strictly follow these rules:\n",
    );

    out.push_str("1) Convert all units to millimeters as follows:\n");
    for unit in UnitToken::ALL {
        if unit == UnitToken::Unspecified {
            continue;
        }
        let how = if unit.multiplier() == 1.0 {
            "Use the value as-is.".to_string()
        } else {
            format!("Multiply by {} to convert to millimeters.", unit.multiplier())
        };
        let _ = writeln!(out, "   - {} ({}): {}", unit.name(), unit.symbol(), how);
    }
    out.push_str("2) If no unit is specified, assume the value is in millimeters.\n");
    let _ = writeln!(
        out,
        "3) If the user mentions {} or similar, set the distance to 1 millimeter.",
        quoted(&lexicon.marker_phrases())
    );
    let _ = writeln!(
        out,
        "4) If no indication of distance is detected, output '{}'.",
        Displacement::ZERO
    );
    out.push_str("5) Use directional keywords to adjust the axis:\n");
    for axis in Axis::ALL {
        out.push_str(&axis_rule(lexicon, axis));
        out.push('\n');
    }
    out.push_str(
        "6) Ensure the output is always in this exact format: \
         delta_x, delta_y, delta_z = a, b, c; where a, b, and c are floats \
         representing distances in millimeters.\n",
    );
    let _ = writeln!(
        out,
        "7) If the input mentions multiple directions or units, convert and apply each \
         direction separately, then output in the correct format (e.g., 'move 2 cm up and \
         3 mm to the right', output '{}'). If the same axis is mentioned twice, the later \
         mention wins.",
        Displacement::new(3.0, 0.0, 20.0)
    );
    out.push_str(
        "8) Never include any additional characters such as semicolons, quotes, \
         or text outside of the output format.",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_unit_and_axis() {
        let prompt = build_system_prompt(&Lexicon::default());
        assert!(prompt.contains("Feet (ft): Multiply by 304.8"));
        assert!(prompt.contains("Inches (in): Multiply by 25.4"));
        assert!(prompt.contains("Millimeters (mm): Use the value as-is."));
        assert!(prompt.contains("Vertical (z-axis)"));
        assert!(prompt.contains("'toward me'"));
        assert!(prompt.contains("'delta_x, delta_y, delta_z = 0.0, 0.0, 0.0'"));
        assert!(!prompt.contains("Unspecified"));
    }

    #[test]
    fn prompt_follows_lexicon_extensions() {
        let mut lexicon = Lexicon::default();
        lexicon.qualitative_markers.push(crate::MarkerCue {
            phrase: "a wee bit".to_string(),
            pattern: None,
        });
        assert!(build_system_prompt(&lexicon).contains("'a wee bit'"));
    }

    #[test]
    fn few_shot_replies_use_reply_grammar() {
        assert_eq!(FEW_SHOT.len(), 11);
        assert_eq!(
            FEW_SHOT[5].reply(),
            "delta_x, delta_y, delta_z = 0.0, -304.8, 0.0"
        );
        for example in FEW_SHOT {
            assert_eq!(
                Displacement::parse_reply(&example.reply()).unwrap(),
                example.displacement()
            );
        }
    }
}
