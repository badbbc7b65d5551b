//! Per-hypothesis local data structures
//!
//! A local data structure is a variable set that can be specialized per
//! modelling hypothesis: a base list applies under any hypothesis, and the
//! first specialization of a given hypothesis starts from a copy of the
//! base list.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::parser::error::ParseError;

use super::hypothesis::ModellingHypothesis;

/// One variable of a local data structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub type_name: SmolStr,
    pub name: SmolStr,
}

impl LocalVariable {
    pub fn new(type_name: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// A variable set specializable per modelling hypothesis.
#[derive(Debug, Default, Clone)]
pub struct LocalDataStructure {
    /// Name of the structure in generated code
    pub name: SmolStr,
    /// Variables declared for the unspecialised case
    base: Vec<LocalVariable>,
    /// Per-hypothesis specializations, each seeded from `base` on first use
    specialized: FxHashMap<ModellingHypothesis, Vec<LocalVariable>>,
}

impl LocalDataStructure {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a variable, either to the base list (`hypothesis == None`, which
    /// also propagates into every existing specialization) or to one
    /// hypothesis' list, seeding it from the base list on first use.
    ///
    /// A name already present in the effective list is an error.
    pub fn add_variable(
        &mut self,
        hypothesis: Option<ModellingHypothesis>,
        v: LocalVariable,
    ) -> Result<&mut Self, ParseError> {
        const M: &str = "LocalDataStructure::add_variable";
        let add = |list: &mut Vec<LocalVariable>, v: &LocalVariable| -> Result<(), ParseError> {
            if list.iter().any(|x| x.name == v.name) {
                return Err(ParseError::semantic(
                    M,
                    format!("member '{}' multiply defined", v.name),
                ));
            }
            list.push(v.clone());
            Ok(())
        };
        match hypothesis {
            None => {
                add(&mut self.base, &v)?;
                for list in self.specialized.values_mut() {
                    add(list, &v)?;
                }
            }
            Some(h) => {
                let list = self
                    .specialized
                    .entry(h)
                    .or_insert_with(|| self.base.clone());
                add(list, &v)?;
            }
        }
        Ok(self)
    }

    /// Hypotheses with an explicit specialization.
    pub fn specialised_hypotheses(&self) -> Vec<ModellingHypothesis> {
        let mut hs: Vec<_> = self.specialized.keys().copied().collect();
        hs.sort();
        hs
    }

    /// The effective variable list for a hypothesis.
    ///
    /// `None` as the hypothesis selects the base list; a hypothesis without
    /// a specialization yields `None` — an expected absence, not an error.
    pub fn get(&self, hypothesis: Option<ModellingHypothesis>) -> Option<&[LocalVariable]> {
        match hypothesis {
            None => Some(&self.base),
            Some(h) => self.specialized.get(&h).map(Vec::as_slice),
        }
    }

    pub fn contains(&self, hypothesis: Option<ModellingHypothesis>, name: &str) -> bool {
        self.get(hypothesis)
            .is_some_and(|vars| vars.iter().any(|v| v.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ModellingHypothesis::PlaneStrain;
    use ModellingHypothesis::Tridimensional;

    #[test]
    fn test_base_propagates_to_specializations() {
        let mut d = LocalDataStructure::default();
        d.add_variable(Some(PlaneStrain), LocalVariable::new("real", "a"))
            .unwrap();
        d.add_variable(None, LocalVariable::new("real", "b")).unwrap();
        assert!(d.contains(Some(PlaneStrain), "a"));
        assert!(d.contains(Some(PlaneStrain), "b"));
        assert!(d.contains(None, "b"));
        assert!(!d.contains(None, "a"));
    }

    #[test]
    fn test_specialization_seeds_from_base() {
        let mut d = LocalDataStructure::default();
        d.add_variable(None, LocalVariable::new("real", "a")).unwrap();
        d.add_variable(Some(Tridimensional), LocalVariable::new("real", "b"))
            .unwrap();
        let vars = d.get(Some(Tridimensional)).unwrap();
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_duplicate_in_effective_list_fails() {
        let mut d = LocalDataStructure::default();
        d.add_variable(None, LocalVariable::new("real", "a")).unwrap();
        let err = d
            .add_variable(Some(PlaneStrain), LocalVariable::new("real", "a"))
            .unwrap_err();
        assert!(err.message.contains("multiply defined"));
    }

    #[test]
    fn test_get_unspecialised_hypothesis_is_none() {
        let mut d = LocalDataStructure::default();
        d.add_variable(None, LocalVariable::new("real", "a")).unwrap();
        assert!(d.get(Some(PlaneStrain)).is_none());
        assert!(d.specialised_hypotheses().is_empty());
    }
}
