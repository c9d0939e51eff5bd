//! The fixed reply grammar: `delta_x, delta_y, delta_z = a, b, c`

use crate::{Displacement, InterpretError, Result};
use std::fmt;

const LHS: [&str; 3] = ["delta_x", "delta_y", "delta_z"];

/// Round away float noise such as `76.19999999999999` from unit conversion
fn tidy(value: f64) -> f64 {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Millimeter value as written in the reply grammar (`36.0`, `-304.8`)
pub fn format_mm(value: f64) -> String {
    let value = tidy(value);
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Unsigned magnitude as spoken back to the operator (`500`, `25.4`)
pub fn format_magnitude(value: f64) -> String {
    let value = tidy(value.abs());
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Displacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delta_x, delta_y, delta_z = {}, {}, {}",
            format_mm(self.delta_x),
            format_mm(self.delta_y),
            format_mm(self.delta_z)
        )
    }
}

impl Displacement {
    /// Parse a backend reply in the fixed grammar
    ///
    /// Whitespace is tolerated anywhere, integers are accepted as floats and a
    /// single trailing period is ignored. Anything else is unrecognized.
    pub fn parse_reply(reply: &str) -> Result<Displacement> {
        let unrecognized = || InterpretError::UnrecognizedInput(format!("reply: {:?}", reply));

        let text = reply.trim();
        let text = text.strip_suffix('.').unwrap_or(text).trim_end();
        let (lhs, rhs) = text.split_once('=').ok_or_else(unrecognized)?;

        let names: Vec<&str> = lhs.split(',').map(str::trim).collect();
        if names != LHS {
            return Err(unrecognized());
        }

        let values = rhs
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| unrecognized())?;

        match values.as_slice() {
            [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => {
                Ok(Displacement::new(*x, *y, *z))
            }
            _ => Err(unrecognized()),
        }
    }
}
