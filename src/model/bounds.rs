//! Bounds descriptions
//!
//! Physical and standard bounds on declared variables. Standard bounds
//! trigger the out-of-bounds policy at runtime; physical bounds are hard
//! limits of validity of the behaviour.

use smol_str::SmolStr;

/// Which sides of the interval are bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsType {
    Lower,
    Upper,
    LowerAndUpper,
}

/// A bounds declaration on one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsDescription {
    pub name: SmolStr,
    pub bounds_type: BoundsType,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Physical bounds are hard validity limits, standard bounds follow the
    /// out-of-bounds policy
    pub physical: bool,
    pub line: u32,
}

impl BoundsDescription {
    pub fn lower(name: impl Into<SmolStr>, lower: f64, physical: bool, line: u32) -> Self {
        Self {
            name: name.into(),
            bounds_type: BoundsType::Lower,
            lower_bound: lower,
            upper_bound: f64::INFINITY,
            physical,
            line,
        }
    }

    pub fn upper(name: impl Into<SmolStr>, upper: f64, physical: bool, line: u32) -> Self {
        Self {
            name: name.into(),
            bounds_type: BoundsType::Upper,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: upper,
            physical,
            line,
        }
    }

    pub fn range(
        name: impl Into<SmolStr>,
        lower: f64,
        upper: f64,
        physical: bool,
        line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            bounds_type: BoundsType::LowerAndUpper,
            lower_bound: lower,
            upper_bound: upper,
            physical,
            line,
        }
    }
}
