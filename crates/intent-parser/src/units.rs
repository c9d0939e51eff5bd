//! Length units and their conversion to millimeters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit attached to a spoken magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitToken {
    #[serde(alias = "mm")]
    Millimeters,
    #[serde(alias = "cm")]
    Centimeters,
    #[serde(alias = "m")]
    Meters,
    #[serde(alias = "in")]
    Inches,
    #[serde(alias = "ft")]
    Feet,
    /// No unit was spoken; read as millimeters
    Unspecified,
}

impl UnitToken {
    pub const ALL: [UnitToken; 6] = [
        UnitToken::Millimeters,
        UnitToken::Centimeters,
        UnitToken::Meters,
        UnitToken::Inches,
        UnitToken::Feet,
        UnitToken::Unspecified,
    ];

    /// Multiplier that takes a value in this unit to millimeters
    pub fn multiplier(&self) -> f64 {
        match self {
            UnitToken::Millimeters => 1.0,
            UnitToken::Centimeters => 10.0,
            UnitToken::Meters => 1000.0,
            UnitToken::Inches => 25.4,
            UnitToken::Feet => 304.8,
            UnitToken::Unspecified => 1.0,
        }
    }

    /// Convert a value from this unit to millimeters
    pub fn to_millimeters(&self, value: f64) -> f64 {
        value * self.multiplier()
    }

    /// Convert a millimeter value back into this unit
    pub fn from_millimeters(&self, millimeters: f64) -> f64 {
        millimeters / self.multiplier()
    }

    /// Short symbol ("mm", "cm", ...)
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitToken::Millimeters => "mm",
            UnitToken::Centimeters => "cm",
            UnitToken::Meters => "m",
            UnitToken::Inches => "in",
            UnitToken::Feet => "ft",
            UnitToken::Unspecified => "",
        }
    }

    /// Spelled-out name used in prompts
    pub fn name(&self) -> &'static str {
        match self {
            UnitToken::Millimeters => "Millimeters",
            UnitToken::Centimeters => "Centimeters",
            UnitToken::Meters => "Meters",
            UnitToken::Inches => "Inches",
            UnitToken::Feet => "Feet",
            UnitToken::Unspecified => "Unspecified",
        }
    }
}

impl fmt::Display for UnitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitToken::Unspecified => f.write_str("unspecified"),
            other => f.write_str(other.symbol()),
        }
    }
}
