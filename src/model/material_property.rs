//! Material property description
//!
//! The description accumulated by a material-property DSL run: the law and
//! material names, the output, the inputs, the parameters with their
//! default values, and the body of the generated function.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::parser::code_block::CodeBlock;
use crate::parser::error::ParseError;

use super::attributes::MaterialKnowledgeDescription;
use super::bounds::BoundsDescription;
use super::names::NamePool;
use super::static_variable::StaticVariableDescription;
use super::variable::{VariableDescription, VariableDescriptionContainer};

/// The accumulated description of one material property.
#[derive(Debug, Default, Clone)]
pub struct MaterialPropertyDescription {
    law: String,
    material: String,

    /// Name of the computed quantity; `res` unless `@Output` renames it
    output: SmolStr,
    inputs: VariableDescriptionContainer,
    parameters: VariableDescriptionContainer,
    parameters_values: FxHashMap<SmolStr, f64>,

    static_variables: Vec<StaticVariableDescription>,
    bounds: Vec<BoundsDescription>,
    attributes: MaterialKnowledgeDescription,

    /// Body of the generated function
    function: CodeBlock,
    includes: String,
}

impl MaterialPropertyDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_law_name(&mut self, name: impl Into<String>) -> Result<(), ParseError> {
        if !self.law.is_empty() {
            return Err(ParseError::semantic(
                "MaterialPropertyDescription::set_law_name",
                "law name already defined",
            ));
        }
        self.law = name.into();
        Ok(())
    }

    pub fn law_name(&self) -> &str {
        &self.law
    }

    pub fn set_material_name(&mut self, name: impl Into<String>) -> Result<(), ParseError> {
        if !self.material.is_empty() {
            return Err(ParseError::semantic(
                "MaterialPropertyDescription::set_material_name",
                "material name already defined",
            ));
        }
        self.material = name.into();
        Ok(())
    }

    pub fn material_name(&self) -> &str {
        &self.material
    }

    /// `<material>_<law>`, or `<law>` when no material is set. The stem of
    /// generated function and file names.
    pub fn material_law_name(&self) -> String {
        if self.material.is_empty() {
            self.law.clone()
        } else {
            format!("{}_{}", self.material, self.law)
        }
    }

    pub fn set_output_name(&mut self, name: impl Into<SmolStr>) -> Result<(), ParseError> {
        if !self.output.is_empty() {
            return Err(ParseError::semantic(
                "MaterialPropertyDescription::set_output_name",
                "output already defined",
            ));
        }
        self.output = name.into();
        Ok(())
    }

    /// Name of the computed quantity.
    pub fn output_name(&self) -> &str {
        if self.output.is_empty() {
            "res"
        } else {
            &self.output
        }
    }

    /// Register input variables; names must be unique across inputs and
    /// parameters, and free in the reserved pool.
    pub fn register_inputs(
        &mut self,
        pool: &mut NamePool,
        vars: VariableDescriptionContainer,
    ) -> Result<(), ParseError> {
        self.register(pool, vars, false)
    }

    /// Register parameters, same uniqueness contract as inputs.
    pub fn register_parameters(
        &mut self,
        pool: &mut NamePool,
        vars: VariableDescriptionContainer,
    ) -> Result<(), ParseError> {
        self.register(pool, vars, true)
    }

    fn register(
        &mut self,
        pool: &mut NamePool,
        vars: VariableDescriptionContainer,
        parameters: bool,
    ) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDescription::register";
        for v in &vars {
            if self.inputs.contains(&v.name) || self.parameters.contains(&v.name) {
                return Err(ParseError::new(
                    M,
                    format!("variable '{}' already declared", v.name),
                    Some(v.line),
                ));
            }
            pool.reserve(v.name.clone()).map_err(|e| e.or_at_line(v.line))?;
        }
        let container = if parameters {
            &mut self.parameters
        } else {
            &mut self.inputs
        };
        for v in vars {
            container.push(v);
        }
        Ok(())
    }

    pub fn inputs(&self) -> &VariableDescriptionContainer {
        &self.inputs
    }

    pub fn parameters(&self) -> &VariableDescriptionContainer {
        &self.parameters
    }

    pub fn is_input_name(&self, n: &str) -> bool {
        self.inputs.contains(n)
    }

    pub fn is_parameter_name(&self, n: &str) -> bool {
        self.parameters.contains(n)
    }

    pub fn parameters_values(&self) -> &FxHashMap<SmolStr, f64> {
        &self.parameters_values
    }

    pub fn set_parameter_default_value(
        &mut self,
        name: impl Into<SmolStr>,
        value: f64,
    ) -> Result<(), ParseError> {
        let name = name.into();
        if self.parameters_values.insert(name.clone(), value).is_some() {
            return Err(ParseError::semantic(
                "MaterialPropertyDescription::set_parameter_default_value",
                format!("default value already defined for parameter '{name}'"),
            ));
        }
        Ok(())
    }

    pub fn add_static_variable(&mut self, v: StaticVariableDescription) {
        self.static_variables.push(v);
    }

    pub fn static_variables(&self) -> &[StaticVariableDescription] {
        &self.static_variables
    }

    /// Add a bounds declaration; the bounded name must be an input.
    pub fn add_bounds(&mut self, b: BoundsDescription) -> Result<(), ParseError> {
        if !self.inputs.contains(&b.name) {
            return Err(ParseError::new(
                "MaterialPropertyDescription::add_bounds",
                format!("no input named '{}'", b.name),
                Some(b.line),
            ));
        }
        self.bounds.push(b);
        Ok(())
    }

    pub fn bounds(&self) -> &[BoundsDescription] {
        &self.bounds
    }

    pub fn attributes(&self) -> &MaterialKnowledgeDescription {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut MaterialKnowledgeDescription {
        &mut self.attributes
    }

    /// Install the function body. One-shot.
    pub fn set_function(&mut self, f: CodeBlock) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDescription::set_function";
        if !self.function.code.is_empty() {
            return Err(ParseError::semantic(M, "function already defined"));
        }
        if f.code.trim().is_empty() {
            return Err(ParseError::semantic(M, "empty function"));
        }
        self.function = f;
        Ok(())
    }

    pub fn function(&self) -> &CodeBlock {
        &self.function
    }

    pub fn has_function(&self) -> bool {
        !self.function.code.is_empty()
    }

    pub fn append_to_includes(&mut self, code: &str) {
        if !self.includes.is_empty() && !self.includes.ends_with('\n') {
            self.includes.push('\n');
        }
        self.includes.push_str(code);
    }

    pub fn includes(&self) -> &str {
        &self.includes
    }

    /// Variable lookup across inputs and parameters.
    pub fn variable(&self, n: &str) -> Option<&VariableDescription> {
        self.inputs.get(n).or_else(|| self.parameters.get(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> VariableDescriptionContainer {
        names
            .iter()
            .map(|n| VariableDescription::new("real", *n, 1, 1))
            .collect()
    }

    #[test]
    fn test_material_law_name() {
        let mut mpd = MaterialPropertyDescription::new();
        mpd.set_law_name("YoungModulus").unwrap();
        assert_eq!(mpd.material_law_name(), "YoungModulus");
        mpd.set_material_name("UO2").unwrap();
        assert_eq!(mpd.material_law_name(), "UO2_YoungModulus");
    }

    #[test]
    fn test_law_name_one_shot() {
        let mut mpd = MaterialPropertyDescription::new();
        mpd.set_law_name("A").unwrap();
        assert!(mpd.set_law_name("B").is_err());
    }

    #[test]
    fn test_input_parameter_collision() {
        let mut mpd = MaterialPropertyDescription::new();
        let mut pool = NamePool::new();
        mpd.register_inputs(&mut pool, vars(&["T"])).unwrap();
        let err = mpd.register_parameters(&mut pool, vars(&["T"])).unwrap_err();
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn test_output_defaults_to_res() {
        let mut mpd = MaterialPropertyDescription::new();
        assert_eq!(mpd.output_name(), "res");
        mpd.set_output_name("E").unwrap();
        assert_eq!(mpd.output_name(), "E");
        assert!(mpd.set_output_name("F").is_err());
    }

    #[test]
    fn test_function_one_shot_and_non_empty() {
        let mut mpd = MaterialPropertyDescription::new();
        assert!(mpd.set_function(CodeBlock::default()).is_err());
        let mut f = CodeBlock::default();
        f.code = "res = 2.e5 ;".to_owned();
        mpd.set_function(f.clone()).unwrap();
        assert!(mpd.set_function(f).is_err());
    }

    #[test]
    fn test_parameter_default_duplicate() {
        let mut mpd = MaterialPropertyDescription::new();
        mpd.set_parameter_default_value("e", 1.0).unwrap();
        assert!(mpd.set_parameter_default_value("e", 2.0).is_err());
    }
}
