//! Static variable descriptions

use smol_str::SmolStr;

/// Constant value of a static variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticVariableValue {
    Int(i64),
    Real(f64),
}

impl StaticVariableValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Real(_) => None,
        }
    }
}

impl std::fmt::Display for StaticVariableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v:e}"),
        }
    }
}

/// Description of a static variable. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticVariableDescription {
    pub type_name: SmolStr,
    pub name: SmolStr,
    pub line: u32,
    pub value: StaticVariableValue,
}

impl StaticVariableDescription {
    pub fn new(
        type_name: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        line: u32,
        value: StaticVariableValue,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            line,
            value,
        }
    }
}
