//! Behaviour description
//!
//! The mutable data structure a behaviour DSL run accumulates parsed facts
//! into: main variable pairs, symmetry, supported hypotheses, variables by
//! category, bounds, attributes and code blocks. Mutation is monotonic;
//! once code generation starts the description is only read.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::parser::error::ParseError;

use super::attributes::MaterialKnowledgeDescription;
use super::bounds::BoundsDescription;
use super::hypothesis::ModellingHypothesis;
use super::local_data::LocalDataStructure;
use super::names::NamePool;
use super::static_variable::StaticVariableDescription;
use super::types::{TypeSize, flag_of};
use super::variable::{VariableDescription, VariableDescriptionContainer};

/// Kind of a behaviour, fixed by its main-variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BehaviourType {
    /// No canonical main variables; `add_main_variable` is legal
    #[default]
    General,
    SmallStrainStandard,
    FiniteStrainStandard,
    CohesiveZoneModel,
}

/// Symmetry of the material or of its elastic response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymmetryType {
    #[default]
    Isotropic,
    Orthotropic,
}

/// An input quantity driving the behaviour's main physical relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrivingVariable {
    pub name: SmolStr,
    pub type_name: SmolStr,
    /// Whether host codes provide the increment of this variable
    pub increment_known: bool,
}

/// The output quantity conjugated to a driving variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermodynamicForce {
    pub name: SmolStr,
    pub type_name: SmolStr,
}

/// Categories of declared variables. A name must be unique across all of
/// them within one behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableCategory {
    MaterialProperty,
    StateVariable,
    AuxiliaryStateVariable,
    ExternalStateVariable,
    LocalVariable,
    Parameter,
}

/// The accumulated description of one behaviour.
#[derive(Debug, Default, Clone)]
pub struct BehaviourDescription {
    dsl_name: String,
    behaviour_name: SmolStr,
    material: String,
    library: String,

    behaviour_type: BehaviourType,
    main_variables: Vec<(DrivingVariable, ThermodynamicForce)>,
    symmetry: SymmetryType,
    elastic_symmetry: SymmetryType,

    hypotheses: IndexSet<ModellingHypothesis>,
    hypotheses_declared: bool,

    material_properties: VariableDescriptionContainer,
    state_variables: VariableDescriptionContainer,
    auxiliary_state_variables: VariableDescriptionContainer,
    external_state_variables: VariableDescriptionContainer,
    local_variables: VariableDescriptionContainer,
    parameters: VariableDescriptionContainer,
    parameters_default_values: FxHashMap<SmolStr, f64>,
    integer_parameters_default_values: FxHashMap<SmolStr, i64>,
    unsigned_short_parameters_default_values: FxHashMap<SmolStr, u16>,

    static_variables: Vec<StaticVariableDescription>,
    bounds: Vec<BoundsDescription>,
    local_data_structures: Vec<LocalDataStructure>,
    attributes: MaterialKnowledgeDescription,

    use_qt: bool,
    requires_stiffness_operator: bool,
    requires_thermal_expansion_tensor: bool,
    usable_in_purely_implicit_resolution: bool,
    /// External state variables flagged as probably unusable in a purely
    /// implicit resolution
    pupirv: IndexSet<SmolStr>,

    includes: String,
    sources: String,
    members: String,
    private_code: String,
}

impl BehaviourDescription {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Naming
    // =========================================================================

    pub fn set_dsl_name(&mut self, name: impl Into<String>) {
        self.dsl_name = name.into();
    }

    pub fn dsl_name(&self) -> &str {
        &self.dsl_name
    }

    pub fn set_behaviour_name(&mut self, name: impl Into<SmolStr>) -> Result<(), ParseError> {
        if !self.behaviour_name.is_empty() {
            return Err(ParseError::semantic(
                "BehaviourDescription::set_behaviour_name",
                "behaviour name already defined",
            ));
        }
        self.behaviour_name = name.into();
        Ok(())
    }

    pub fn behaviour_name(&self) -> &str {
        &self.behaviour_name
    }

    pub fn set_material_name(&mut self, name: impl Into<String>) -> Result<(), ParseError> {
        if !self.material.is_empty() {
            return Err(ParseError::semantic(
                "BehaviourDescription::set_material_name",
                "material name already defined",
            ));
        }
        self.material = name.into();
        Ok(())
    }

    pub fn material_name(&self) -> &str {
        &self.material
    }

    pub fn set_library(&mut self, name: impl Into<String>) -> Result<(), ParseError> {
        if !self.library.is_empty() {
            return Err(ParseError::semantic(
                "BehaviourDescription::set_library",
                "library name already defined",
            ));
        }
        self.library = name.into();
        Ok(())
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    // =========================================================================
    // Main variables and behaviour type
    // =========================================================================

    pub fn behaviour_type(&self) -> BehaviourType {
        self.behaviour_type
    }

    pub fn main_variables(&self) -> &[(DrivingVariable, ThermodynamicForce)] {
        &self.main_variables
    }

    /// Declare the canonical strain/stress pair of a small-strain standard
    /// behaviour and lock the behaviour type. One-shot.
    pub fn declare_as_a_small_strain_standard_behaviour(&mut self) -> Result<(), ParseError> {
        self.declare_standard(
            "BehaviourDescription::declare_as_a_small_strain_standard_behaviour",
            BehaviourType::SmallStrainStandard,
            DrivingVariable {
                name: SmolStr::new_static("eto"),
                type_name: SmolStr::new_static("StrainStensor"),
                increment_known: true,
            },
            ThermodynamicForce {
                name: SmolStr::new_static("sig"),
                type_name: SmolStr::new_static("StressStensor"),
            },
        )
    }

    /// Declare the canonical deformation-gradient/stress pair of a
    /// finite-strain standard behaviour and lock the behaviour type.
    pub fn declare_as_a_finite_strain_standard_behaviour(&mut self) -> Result<(), ParseError> {
        self.declare_standard(
            "BehaviourDescription::declare_as_a_finite_strain_standard_behaviour",
            BehaviourType::FiniteStrainStandard,
            DrivingVariable {
                name: SmolStr::new_static("F"),
                type_name: SmolStr::new_static("DeformationGradientTensor"),
                increment_known: false,
            },
            ThermodynamicForce {
                name: SmolStr::new_static("sig"),
                type_name: SmolStr::new_static("StressStensor"),
            },
        )
    }

    /// Declare the canonical opening-displacement/traction pair of a
    /// cohesive zone model and lock the behaviour type.
    pub fn declare_as_a_cohesive_zone_model(&mut self) -> Result<(), ParseError> {
        self.declare_standard(
            "BehaviourDescription::declare_as_a_cohesive_zone_model",
            BehaviourType::CohesiveZoneModel,
            DrivingVariable {
                name: SmolStr::new_static("u"),
                type_name: SmolStr::new_static("DisplacementTVector"),
                increment_known: true,
            },
            ThermodynamicForce {
                name: SmolStr::new_static("t"),
                type_name: SmolStr::new_static("ForceTVector"),
            },
        )
    }

    fn declare_standard(
        &mut self,
        operation: &str,
        kind: BehaviourType,
        dv: DrivingVariable,
        tf: ThermodynamicForce,
    ) -> Result<(), ParseError> {
        if !self.main_variables.is_empty() {
            return Err(ParseError::semantic(
                operation,
                "some driving variables are already declared",
            ));
        }
        self.main_variables.push((dv, tf));
        self.behaviour_type = kind;
        Ok(())
    }

    /// Add a main-variable pair. Only legal while the behaviour type is
    /// still the general one.
    pub fn add_main_variable(
        &mut self,
        dv: DrivingVariable,
        tf: ThermodynamicForce,
    ) -> Result<(), ParseError> {
        const M: &str = "BehaviourDescription::add_main_variable";
        if self.behaviour_type != BehaviourType::General {
            return Err(ParseError::semantic(
                M,
                "a main variable can not be added to a behaviour which is not a general one",
            ));
        }
        if self.main_variables.iter().any(|(v, _)| v.name == dv.name) {
            return Err(ParseError::semantic(
                M,
                format!("a driving variable '{}' has already been declared", dv.name),
            ));
        }
        self.main_variables.push((dv, tf));
        Ok(())
    }

    pub fn is_driving_variable_name(&self, n: &str) -> bool {
        self.main_variables.iter().any(|(v, _)| v.name == n)
    }

    pub fn is_driving_variable_increment_name(&self, n: &str) -> bool {
        self.main_variables
            .iter()
            .any(|(v, _)| v.increment_known && format!("d{}", v.name) == n)
    }

    /// Combined sizes of the driving variables and of the thermodynamic
    /// forces.
    pub fn main_variables_size(&self) -> Result<(TypeSize, TypeSize), ParseError> {
        const M: &str = "BehaviourDescription::main_variables_size";
        let mut dv = TypeSize::default();
        let mut tf = TypeSize::default();
        for (v, f) in &self.main_variables {
            let vf = flag_of(&v.type_name).ok_or_else(|| {
                ParseError::semantic(M, format!("unsupported type '{}'", v.type_name))
            })?;
            let ff = flag_of(&f.type_name).ok_or_else(|| {
                ParseError::semantic(M, format!("unsupported type '{}'", f.type_name))
            })?;
            dv += TypeSize::of(vf, 1);
            tf += TypeSize::of(ff, 1);
        }
        Ok((dv, tf))
    }

    /// Type of the stiffness operator in generated code.
    pub fn stiffness_operator_type(&self) -> Result<String, ParseError> {
        match self.behaviour_type {
            BehaviourType::General => {
                let (dv, tf) = self.main_variables_size()?;
                Ok(format!("matforge::math::tmatrix<{dv},{tf},real>"))
            }
            BehaviourType::SmallStrainStandard => Ok("StiffnessTensor".to_owned()),
            BehaviourType::FiniteStrainStandard => Ok("FiniteStrainStiffnessTensor".to_owned()),
            BehaviourType::CohesiveZoneModel => {
                Ok("matforge::math::tmatrix<N,N,stress>".to_owned())
            }
        }
    }

    // =========================================================================
    // Symmetry
    // =========================================================================

    pub fn symmetry_type(&self) -> SymmetryType {
        self.symmetry
    }

    pub fn set_symmetry_type(&mut self, s: SymmetryType) {
        self.symmetry = s;
    }

    pub fn elastic_symmetry_type(&self) -> SymmetryType {
        self.elastic_symmetry
    }

    pub fn set_elastic_symmetry_type(&mut self, s: SymmetryType) {
        self.elastic_symmetry = s;
    }

    // =========================================================================
    // Modelling hypotheses
    // =========================================================================

    pub fn hypotheses(&self) -> impl Iterator<Item = &ModellingHypothesis> {
        self.hypotheses.iter()
    }

    pub fn supports(&self, h: ModellingHypothesis) -> bool {
        self.hypotheses.contains(&h)
    }

    /// Install the default hypotheses list.
    pub fn set_default_hypotheses(&mut self) {
        self.hypotheses = ModellingHypothesis::default_hypotheses()
            .iter()
            .copied()
            .collect();
    }

    /// Declare the supported hypotheses. One-shot.
    pub fn set_hypotheses(
        &mut self,
        hs: impl IntoIterator<Item = ModellingHypothesis>,
    ) -> Result<(), ParseError> {
        const M: &str = "BehaviourDescription::set_hypotheses";
        if self.hypotheses_declared {
            return Err(ParseError::semantic(
                M,
                "supported modelling hypotheses already declared",
            ));
        }
        let hs: IndexSet<_> = hs.into_iter().collect();
        if hs.is_empty() {
            return Err(ParseError::semantic(M, "no hypothesis given"));
        }
        self.hypotheses = hs;
        self.hypotheses_declared = true;
        Ok(())
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Register variables into one category.
    ///
    /// Each name must be free across all categories and absent from the
    /// reserved-name pool; registration reserves it.
    pub fn register_variables(
        &mut self,
        pool: &mut NamePool,
        vars: VariableDescriptionContainer,
        category: VariableCategory,
    ) -> Result<(), ParseError> {
        const M: &str = "BehaviourDescription::register_variables";
        for v in &vars {
            if self.is_variable_name_known(&v.name) {
                return Err(ParseError::new(
                    M,
                    format!("variable '{}' already declared", v.name),
                    Some(v.line),
                ));
            }
            pool.reserve(v.name.clone()).map_err(|e| e.or_at_line(v.line))?;
        }
        let container = self.container_mut(category);
        for v in vars {
            container.push(v);
        }
        Ok(())
    }

    fn container_mut(&mut self, category: VariableCategory) -> &mut VariableDescriptionContainer {
        match category {
            VariableCategory::MaterialProperty => &mut self.material_properties,
            VariableCategory::StateVariable => &mut self.state_variables,
            VariableCategory::AuxiliaryStateVariable => &mut self.auxiliary_state_variables,
            VariableCategory::ExternalStateVariable => &mut self.external_state_variables,
            VariableCategory::LocalVariable => &mut self.local_variables,
            VariableCategory::Parameter => &mut self.parameters,
        }
    }

    fn is_variable_name_known(&self, n: &str) -> bool {
        self.material_properties.contains(n)
            || self.state_variables.contains(n)
            || self.auxiliary_state_variables.contains(n)
            || self.external_state_variables.contains(n)
            || self.local_variables.contains(n)
            || self.parameters.contains(n)
            || self.is_driving_variable_name(n)
    }

    pub fn material_properties(&self) -> &VariableDescriptionContainer {
        &self.material_properties
    }

    pub fn state_variables(&self) -> &VariableDescriptionContainer {
        &self.state_variables
    }

    pub fn auxiliary_state_variables(&self) -> &VariableDescriptionContainer {
        &self.auxiliary_state_variables
    }

    pub fn external_state_variables(&self) -> &VariableDescriptionContainer {
        &self.external_state_variables
    }

    pub fn local_variables(&self) -> &VariableDescriptionContainer {
        &self.local_variables
    }

    pub fn parameters(&self) -> &VariableDescriptionContainer {
        &self.parameters
    }

    pub fn is_material_property_name(&self, n: &str) -> bool {
        self.material_properties.contains(n)
    }

    pub fn is_state_variable_name(&self, n: &str) -> bool {
        self.state_variables.contains(n)
    }

    pub fn is_state_variable_increment_name(&self, n: &str) -> bool {
        n.strip_prefix('d')
            .is_some_and(|rest| self.state_variables.contains(rest))
    }

    pub fn is_external_state_variable_name(&self, n: &str) -> bool {
        self.external_state_variables.contains(n)
    }

    pub fn is_external_state_variable_increment_name(&self, n: &str) -> bool {
        n.strip_prefix('d')
            .is_some_and(|rest| self.external_state_variables.contains(rest))
    }

    pub fn is_parameter_name(&self, n: &str) -> bool {
        self.parameters.contains(n)
    }

    pub fn is_local_variable_name(&self, n: &str) -> bool {
        self.local_variables.contains(n)
    }

    /// Variable description looked up by name across all categories.
    pub fn variable(&self, n: &str) -> Option<&VariableDescription> {
        [
            &self.material_properties,
            &self.state_variables,
            &self.auxiliary_state_variables,
            &self.external_state_variables,
            &self.local_variables,
            &self.parameters,
        ]
        .into_iter()
        .find_map(|c| c.get(n))
    }

    /// Names of all registered member variables, for code-block
    /// qualification.
    pub fn member_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.material_properties
            .iter()
            .chain(&self.state_variables)
            .chain(&self.auxiliary_state_variables)
            .chain(&self.external_state_variables)
            .chain(&self.local_variables)
            .chain(&self.parameters)
            .map(|v| &v.name)
            .chain(self.main_variables.iter().flat_map(|(dv, tf)| {
                [&dv.name, &tf.name]
            }))
    }

    pub fn parameters_default_values(&self) -> &FxHashMap<SmolStr, f64> {
        &self.parameters_default_values
    }

    pub fn set_parameter_default_value(
        &mut self,
        name: impl Into<SmolStr>,
        value: f64,
    ) -> Result<(), ParseError> {
        let name = name.into();
        if self
            .parameters_default_values
            .insert(name.clone(), value)
            .is_some()
        {
            return Err(ParseError::semantic(
                "BehaviourDescription::set_parameter_default_value",
                format!("default value already defined for parameter '{name}'"),
            ));
        }
        Ok(())
    }

    pub fn integer_parameters_default_values(&self) -> &FxHashMap<SmolStr, i64> {
        &self.integer_parameters_default_values
    }

    pub fn unsigned_short_parameters_default_values(&self) -> &FxHashMap<SmolStr, u16> {
        &self.unsigned_short_parameters_default_values
    }

    // =========================================================================
    // Static variables, bounds, attributes
    // =========================================================================

    pub fn add_static_variable(&mut self, v: StaticVariableDescription) {
        self.static_variables.push(v);
    }

    pub fn static_variables(&self) -> &[StaticVariableDescription] {
        &self.static_variables
    }

    pub fn static_variable_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.static_variables.iter().map(|v| &v.name)
    }

    /// Add a bounds declaration; the bounded name must be a declared
    /// variable.
    pub fn add_bounds(&mut self, b: BoundsDescription) -> Result<(), ParseError> {
        if !self.is_variable_name_known(&b.name)
            && !self.external_state_variables.contains(&b.name)
        {
            return Err(ParseError::new(
                "BehaviourDescription::add_bounds",
                format!("no variable named '{}'", b.name),
                Some(b.line),
            ));
        }
        self.bounds.push(b);
        Ok(())
    }

    pub fn bounds(&self) -> &[BoundsDescription] {
        &self.bounds
    }

    /// Attach a per-hypothesis local data structure. Its variable names,
    /// under every hypothesis, must not collide with declared variables.
    pub fn add_local_data_structure(
        &mut self,
        lds: LocalDataStructure,
    ) -> Result<(), ParseError> {
        const M: &str = "BehaviourDescription::add_local_data_structure";
        let mut hypotheses: Vec<Option<ModellingHypothesis>> = vec![None];
        hypotheses.extend(lds.specialised_hypotheses().into_iter().map(Some));
        for h in hypotheses {
            for v in lds.get(h).unwrap_or_default() {
                if self.is_variable_name_known(&v.name) {
                    return Err(ParseError::semantic(
                        M,
                        format!("variable '{}' already declared", v.name),
                    ));
                }
            }
        }
        self.local_data_structures.push(lds);
        Ok(())
    }

    pub fn local_data_structures(&self) -> &[LocalDataStructure] {
        &self.local_data_structures
    }

    pub fn attributes(&self) -> &MaterialKnowledgeDescription {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut MaterialKnowledgeDescription {
        &mut self.attributes
    }

    // =========================================================================
    // Flags
    // =========================================================================

    pub fn set_use_qt(&mut self, b: bool) {
        self.use_qt = b;
    }

    pub fn use_qt(&self) -> bool {
        self.use_qt
    }

    pub fn set_requires_stiffness_operator(&mut self, b: bool) {
        self.requires_stiffness_operator = b;
    }

    pub fn requires_stiffness_operator(&self) -> bool {
        self.requires_stiffness_operator
    }

    pub fn set_requires_thermal_expansion_tensor(&mut self, b: bool) {
        self.requires_thermal_expansion_tensor = b;
    }

    pub fn requires_thermal_expansion_tensor(&self) -> bool {
        self.requires_thermal_expansion_tensor
    }

    pub fn set_usable_in_purely_implicit_resolution(&mut self, b: bool) {
        self.usable_in_purely_implicit_resolution = b;
    }

    pub fn is_usable_in_purely_implicit_resolution(&self) -> bool {
        self.usable_in_purely_implicit_resolution
    }

    pub fn declare_external_state_variable_probably_unusable_in_purely_implicit_resolution(
        &mut self,
        n: impl Into<SmolStr>,
    ) {
        self.pupirv.insert(n.into());
    }

    pub fn external_state_variables_probably_unusable_in_purely_implicit_resolution(
        &self,
    ) -> impl Iterator<Item = &SmolStr> {
        self.pupirv.iter()
    }

    // =========================================================================
    // Code blocks
    // =========================================================================

    pub fn append_to_includes(&mut self, code: &str) {
        append_block(&mut self.includes, code);
    }

    pub fn includes(&self) -> &str {
        &self.includes
    }

    pub fn append_to_sources(&mut self, code: &str) {
        append_block(&mut self.sources, code);
    }

    pub fn sources(&self) -> &str {
        &self.sources
    }

    pub fn append_to_members(&mut self, code: &str) {
        append_block(&mut self.members, code);
    }

    pub fn members(&self) -> &str {
        &self.members
    }

    pub fn append_to_private_code(&mut self, code: &str) {
        append_block(&mut self.private_code, code);
    }

    pub fn private_code(&self) -> &str {
        &self.private_code
    }
}

fn append_block(acc: &mut String, code: &str) {
    if !acc.is_empty() && !acc.ends_with('\n') {
        acc.push('\n');
    }
    acc.push_str(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> VariableDescriptionContainer {
        [VariableDescription::new("real", name, 1, 1)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_declare_small_strain_twice_fails() {
        let mut mb = BehaviourDescription::new();
        mb.declare_as_a_small_strain_standard_behaviour().unwrap();
        assert_eq!(mb.behaviour_type(), BehaviourType::SmallStrainStandard);
        let err = mb.declare_as_a_small_strain_standard_behaviour().unwrap_err();
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn test_add_main_variable_requires_general_type() {
        let mut mb = BehaviourDescription::new();
        mb.declare_as_a_small_strain_standard_behaviour().unwrap();
        let err = mb
            .add_main_variable(
                DrivingVariable {
                    name: "e".into(),
                    type_name: "StrainStensor".into(),
                    increment_known: true,
                },
                ThermodynamicForce {
                    name: "s".into(),
                    type_name: "StressStensor".into(),
                },
            )
            .unwrap_err();
        assert!(err.message.contains("general"));
    }

    #[test]
    fn test_add_main_variable_duplicate_fails() {
        let mut mb = BehaviourDescription::new();
        let dv = DrivingVariable {
            name: "e".into(),
            type_name: "StrainStensor".into(),
            increment_known: true,
        };
        let tf = ThermodynamicForce {
            name: "s".into(),
            type_name: "StressStensor".into(),
        };
        mb.add_main_variable(dv.clone(), tf.clone()).unwrap();
        assert!(mb.add_main_variable(dv, tf).is_err());
        assert!(mb.is_driving_variable_name("e"));
        assert!(mb.is_driving_variable_increment_name("de"));
    }

    #[test]
    fn test_register_variables_cross_category_collision() {
        let mut mb = BehaviourDescription::new();
        let mut pool = NamePool::new();
        mb.register_variables(&mut pool, var("young"), VariableCategory::MaterialProperty)
            .unwrap();
        let err = mb
            .register_variables(&mut pool, var("young"), VariableCategory::StateVariable)
            .unwrap_err();
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn test_register_variables_reserved_name() {
        let mut mb = BehaviourDescription::new();
        let mut pool = NamePool::new();
        let err = mb
            .register_variables(&mut pool, var("sqrt"), VariableCategory::Parameter)
            .unwrap_err();
        assert!(err.message.contains("reserved"));
    }

    #[test]
    fn test_stiffness_operator_type() {
        let mut mb = BehaviourDescription::new();
        mb.declare_as_a_small_strain_standard_behaviour().unwrap();
        assert_eq!(mb.stiffness_operator_type().unwrap(), "StiffnessTensor");

        let mut mb = BehaviourDescription::new();
        mb.add_main_variable(
            DrivingVariable {
                name: "e".into(),
                type_name: "StrainStensor".into(),
                increment_known: true,
            },
            ThermodynamicForce {
                name: "s".into(),
                type_name: "StressStensor".into(),
            },
        )
        .unwrap();
        assert_eq!(
            mb.stiffness_operator_type().unwrap(),
            "matforge::math::tmatrix<StensorSize,StensorSize,real>"
        );
    }

    #[test]
    fn test_set_hypotheses_once() {
        let mut mb = BehaviourDescription::new();
        mb.set_default_hypotheses();
        mb.set_hypotheses([ModellingHypothesis::Tridimensional]).unwrap();
        assert!(mb.supports(ModellingHypothesis::Tridimensional));
        assert!(!mb.supports(ModellingHypothesis::PlaneStrain));
        assert!(mb.set_hypotheses([ModellingHypothesis::PlaneStrain]).is_err());
    }

    #[test]
    fn test_local_data_structure_names_checked_against_variables() {
        use super::super::local_data::{LocalDataStructure, LocalVariable};
        let mut mb = BehaviourDescription::new();
        let mut pool = NamePool::new();
        mb.register_variables(&mut pool, var("p"), VariableCategory::StateVariable)
            .unwrap();

        let mut lds = LocalDataStructure::new("integration_data");
        lds.add_variable(
            Some(ModellingHypothesis::PlaneStrain),
            LocalVariable::new("real", "p"),
        )
        .unwrap();
        let err = mb.add_local_data_structure(lds).unwrap_err();
        assert!(err.message.contains("already declared"));

        let mut lds = LocalDataStructure::new("integration_data");
        lds.add_variable(None, LocalVariable::new("real", "dt_scaling"))
            .unwrap();
        mb.add_local_data_structure(lds).unwrap();
        assert_eq!(mb.local_data_structures().len(), 1);
    }

    #[test]
    fn test_bounds_require_known_variable() {
        let mut mb = BehaviourDescription::new();
        let mut pool = NamePool::new();
        mb.register_variables(&mut pool, var("T"), VariableCategory::ExternalStateVariable)
            .unwrap();
        mb.add_bounds(BoundsDescription::range("T", 293.15, 873.15, false, 4))
            .unwrap();
        let err = mb
            .add_bounds(BoundsDescription::lower("missing", 0.0, false, 5))
            .unwrap_err();
        assert!(err.message.contains("no variable named"));
    }
}
