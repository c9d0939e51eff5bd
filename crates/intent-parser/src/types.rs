use llm_backend::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw operator instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Utterance(String);

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Utterance {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Utterance {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Cartesian axis, operator facing the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Left/right
    X,
    /// Toward/away from the operator
    Y,
    /// Height
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-axis", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn apply(&self, magnitude: f64) -> f64 {
        match self {
            Sign::Positive => magnitude.abs(),
            Sign::Negative => -magnitude.abs(),
        }
    }

    pub fn of(value: f64) -> Sign {
        if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sign::Positive => "positive",
            Sign::Negative => "negative",
        }
    }
}

/// Movement vector in millimeters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement {
        delta_x: 0.0,
        delta_y: 0.0,
        delta_z: 0.0,
    };

    pub fn new(delta_x: f64, delta_y: f64, delta_z: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            delta_z,
        }
    }

    pub fn component(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.delta_x,
            Axis::Y => self.delta_y,
            Axis::Z => self.delta_z,
        }
    }

    /// Copy of this displacement with one axis replaced
    pub fn with_component(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.delta_x = value,
            Axis::Y => self.delta_y = value,
            Axis::Z => self.delta_z = value,
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.delta_x == 0.0 && self.delta_y == 0.0 && self.delta_z == 0.0
    }

    /// Nonzero axes in x, y, z order
    pub fn moves(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL
            .into_iter()
            .map(|axis| (axis, self.component(axis)))
            .filter(|(_, v)| *v != 0.0)
    }

    /// Per-axis comparison within `tolerance` millimeters
    pub fn approx_eq(&self, other: &Displacement, tolerance: f64) -> bool {
        Axis::ALL
            .into_iter()
            .all(|axis| (self.component(axis) - other.component(axis)).abs() <= tolerance)
    }
}

impl From<(f64, f64, f64)> for Displacement {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

/// Result of interpreting one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub displacement: Displacement,
    /// Raw backend reply, when a backend was involved
    pub reply: Option<String>,
    pub usage: TokenUsage,
}

impl Interpretation {
    pub fn local(displacement: Displacement) -> Self {
        Self {
            displacement,
            reply: None,
            usage: TokenUsage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_skip_zero_axes() {
        let d = Displacement::new(-60.0, 0.0, -12.0);
        let moves: Vec<_> = d.moves().collect();
        assert_eq!(moves, vec![(Axis::X, -60.0), (Axis::Z, -12.0)]);
    }

    #[test]
    fn with_component_overwrites_single_axis() {
        let d = Displacement::ZERO
            .with_component(Axis::Y, 5.0)
            .with_component(Axis::Y, -3.0);
        assert_eq!(d, Displacement::new(0.0, -3.0, 0.0));
    }

    #[test]
    fn sign_apply_ignores_input_sign() {
        assert_eq!(Sign::Negative.apply(4.0), -4.0);
        assert_eq!(Sign::Negative.apply(-4.0), -4.0);
        assert_eq!(Sign::Positive.apply(-4.0), 4.0);
    }
}
