//! Modelling hypotheses
//!
//! A modelling hypothesis names a simplification of the governing
//! equations' dimensionality. Behaviours declare the hypotheses they
//! support; generated code is specialized per hypothesis.

use crate::parser::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModellingHypothesis {
    AxisymmetricalGeneralisedPlaneStrain,
    AxisymmetricalGeneralisedPlaneStress,
    Axisymmetrical,
    PlaneStress,
    PlaneStrain,
    GeneralisedPlaneStrain,
    Tridimensional,
}

impl ModellingHypothesis {
    /// The hypotheses assumed when a behaviour declares none explicitly.
    pub fn default_hypotheses() -> &'static [ModellingHypothesis] {
        use ModellingHypothesis::*;
        &[
            AxisymmetricalGeneralisedPlaneStrain,
            Axisymmetrical,
            PlaneStrain,
            GeneralisedPlaneStrain,
            Tridimensional,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        use ModellingHypothesis::*;
        match self {
            AxisymmetricalGeneralisedPlaneStrain => "AxisymmetricalGeneralisedPlaneStrain",
            AxisymmetricalGeneralisedPlaneStress => "AxisymmetricalGeneralisedPlaneStress",
            Axisymmetrical => "Axisymmetrical",
            PlaneStress => "PlaneStress",
            PlaneStrain => "PlaneStrain",
            GeneralisedPlaneStrain => "GeneralisedPlaneStrain",
            Tridimensional => "Tridimensional",
        }
    }

    /// Parse a hypothesis name as written in DSL sources.
    pub fn parse(s: &str, operation: &str, line: u32) -> Result<Self, ParseError> {
        use ModellingHypothesis::*;
        let h = match s {
            "AxisymmetricalGeneralisedPlaneStrain" => AxisymmetricalGeneralisedPlaneStrain,
            "AxisymmetricalGeneralisedPlaneStress" => AxisymmetricalGeneralisedPlaneStress,
            "Axisymmetrical" => Axisymmetrical,
            "PlaneStress" => PlaneStress,
            "PlaneStrain" => PlaneStrain,
            "GeneralisedPlaneStrain" => GeneralisedPlaneStrain,
            "Tridimensional" => Tridimensional,
            _ => {
                return Err(ParseError::new(
                    operation,
                    format!("unknown modelling hypothesis '{s}'"),
                    Some(line),
                ));
            }
        };
        Ok(h)
    }
}

impl std::fmt::Display for ModellingHypothesis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for h in ModellingHypothesis::default_hypotheses() {
            assert_eq!(
                ModellingHypothesis::parse(h.as_str(), "t", 1).unwrap(),
                *h
            );
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = ModellingHypothesis::parse("PlaneChaos", "t", 3).unwrap_err();
        assert!(err.message.contains("unknown modelling hypothesis"));
        assert_eq!(err.line, Some(3));
    }
}
