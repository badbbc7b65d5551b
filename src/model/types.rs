//! Supported variable types
//!
//! The DSL recognizes a fixed set of type flags for the quantities a
//! behaviour manipulates. Each flag contributes a component count per
//! tensorial kind; sizes stay symbolic in the space dimension and are
//! rendered into generated code as `TypeSize` expressions.

use std::ops::{Add, AddAssign};

/// Tensorial kind of a supported type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlag {
    Scalar,
    TVector,
    Stensor,
    Tensor,
}

/// Known type names and their tensorial kinds.
///
/// Each entry also seeds the reserved-name set: a user variable may not
/// shadow a type name.
pub fn type_flags() -> &'static [(&'static str, TypeFlag)] {
    &[
        ("real", TypeFlag::Scalar),
        ("frequency", TypeFlag::Scalar),
        ("stress", TypeFlag::Scalar),
        ("length", TypeFlag::Scalar),
        ("time", TypeFlag::Scalar),
        ("strain", TypeFlag::Scalar),
        ("strainrate", TypeFlag::Scalar),
        ("temperature", TypeFlag::Scalar),
        ("energy_density", TypeFlag::Scalar),
        ("thermalexpansion", TypeFlag::Scalar),
        ("massdensity", TypeFlag::Scalar),
        ("TVector", TypeFlag::TVector),
        ("DisplacementTVector", TypeFlag::TVector),
        ("ForceTVector", TypeFlag::TVector),
        ("Stensor", TypeFlag::Stensor),
        ("StressStensor", TypeFlag::Stensor),
        ("StressRateStensor", TypeFlag::Stensor),
        ("StrainStensor", TypeFlag::Stensor),
        ("StrainRateStensor", TypeFlag::Stensor),
        ("Tensor", TypeFlag::Tensor),
        ("DeformationGradientTensor", TypeFlag::Tensor),
    ]
}

/// Tensorial kind of a declared type name, if it is a known type.
pub fn flag_of(type_name: &str) -> Option<TypeFlag> {
    type_flags()
        .iter()
        .find(|(n, _)| *n == type_name)
        .map(|(_, f)| *f)
}

/// Symbolic size of a set of variables, one counter per tensorial kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TypeSize {
    pub scalars: u32,
    pub tvectors: u32,
    pub stensors: u32,
    pub tensors: u32,
}

impl TypeSize {
    pub fn of(flag: TypeFlag, array_size: u32) -> Self {
        let mut s = Self::default();
        match flag {
            TypeFlag::Scalar => s.scalars = array_size,
            TypeFlag::TVector => s.tvectors = array_size,
            TypeFlag::Stensor => s.stensors = array_size,
            TypeFlag::Tensor => s.tensors = array_size,
        }
        s
    }

    pub fn is_null(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for TypeSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            scalars: self.scalars + rhs.scalars,
            tvectors: self.tvectors + rhs.tvectors,
            stensors: self.stensors + rhs.stensors,
            tensors: self.tensors + rhs.tensors,
        }
    }
}

impl AddAssign for TypeSize {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for TypeSize {
    /// Renders the size as the sum of per-kind contributions, in terms of
    /// the space dimension `N` of the generated code.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        let mut part = |f: &mut std::fmt::Formatter<'_>, count: u32, unit: &str| {
            if count == 0 {
                return Ok(());
            }
            if !first {
                write!(f, "+")?;
            }
            first = false;
            if unit.is_empty() {
                write!(f, "{count}")
            } else if count == 1 {
                write!(f, "{unit}")
            } else {
                write!(f, "{count}*{unit}")
            }
        };
        part(f, self.scalars, "")?;
        part(f, self.tvectors, "TVectorSize")?;
        part(f, self.stensors, "StensorSize")?;
        part(f, self.tensors, "TensorSize")?;
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}
