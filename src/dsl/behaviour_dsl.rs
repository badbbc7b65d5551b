//! Behaviour DSL
//!
//! Interprets behaviour files: declarations of material properties, state
//! variables, parameters, code blocks and generation attributes, mutating a
//! [`BehaviourDescription`]. The default variant declares the canonical
//! small-strain pair at construction; the generic variant leaves the
//! behaviour type open so `@MainVariable` can build it up.

use std::path::Path;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::interfaces::{InterfaceRegistry, MaterialPropertyInterface, TargetsDescription};
use crate::model::{
    BehaviourDescription, DrivingVariable, ModellingHypothesis, SymmetryType, ThermodynamicForce,
    VariableCategory, set_default_out_of_bounds_policy,
};
use crate::parser::code_block::CodeBlockOptions;
use crate::parser::engine::DslEngine;
use crate::parser::error::{DslError, ParseError};
use crate::parser::lexer::{TokenFlag, is_valid_identifier};
use crate::project::CompilerOptions;

use super::{Handler, import_material_law, read_bounds};

pub struct BehaviourDsl {
    engine: DslEngine,
    mb: BehaviourDescription,
    registry: InterfaceRegistry,
    interfaces: Vec<Box<dyn MaterialPropertyInterface>>,
    callbacks: IndexMap<&'static str, Handler<Self>>,
    link_flags: Vec<String>,
}

impl BehaviourDsl {
    /// A behaviour DSL with an open behaviour type; main variables are
    /// declared with `@MainVariable`.
    pub fn generic(options: CompilerOptions) -> Self {
        let mut dsl = Self {
            engine: DslEngine::new(options),
            mb: BehaviourDescription::new(),
            registry: InterfaceRegistry::with_builtin_interfaces(),
            interfaces: Vec::new(),
            callbacks: IndexMap::new(),
            link_flags: Vec::new(),
        };
        dsl.mb.set_dsl_name("BehaviourDSL");
        dsl.register_default_callbacks();
        dsl
    }

    /// The default behaviour DSL: a small-strain standard behaviour.
    pub fn default_small_strain(options: CompilerOptions) -> Result<Self, ParseError> {
        let mut dsl = Self::generic(options);
        dsl.mb.set_dsl_name("DefaultDSL");
        dsl.mb.declare_as_a_small_strain_standard_behaviour()?;
        Ok(dsl)
    }

    pub fn description(&self) -> &BehaviourDescription {
        &self.mb
    }

    pub fn engine(&self) -> &DslEngine {
        &self.engine
    }

    /// Instantiate the named interfaces from the registry.
    pub fn set_interfaces(&mut self, names: &[&str]) -> Result<(), ParseError> {
        for name in names {
            if self.interfaces.iter().any(|i| i.name() == *name) {
                continue;
            }
            self.interfaces.push(self.registry.create(name)?);
        }
        Ok(())
    }

    /// Compile a file into the description model.
    pub fn analyse_file(&mut self, path: &Path) -> Result<(), DslError> {
        self.engine
            .open_file(path, &[], &rustc_hash::FxHashMap::default())?;
        self.analyse()?;
        Ok(())
    }

    /// Compile an in-memory source under a virtual file name.
    pub fn analyse_string(&mut self, source: &str, name: &str) -> Result<(), ParseError> {
        self.engine.open_string(source, name)?;
        self.analyse()
    }

    fn analyse(&mut self) -> Result<(), ParseError> {
        self.analyse_tokens()?;
        if self.mb.hypotheses().next().is_none() {
            self.mb.set_default_hypotheses();
        }
        Ok(())
    }

    fn analyse_tokens(&mut self) -> Result<(), ParseError> {
        while let Some(t) = self.engine.stream.current() {
            let key = t.value.clone();
            let line = t.line;
            self.engine.current_comment = t.comment.clone();
            self.engine.stream.advance();
            match self.callbacks.get(key.as_str()).copied() {
                Some(handler) => {
                    trace!(keyword = %key, line, "treating keyword");
                    handler(self).map_err(|e| e.or_at_line(line))?;
                }
                None => self.treat_unknown_keyword(&key, line)?,
            }
        }
        Ok(())
    }

    /// Offer an unrecognized keyword to every registered interface before
    /// failing.
    fn treat_unknown_keyword(&mut self, key: &str, line: u32) -> Result<(), ParseError> {
        for interface in self.interfaces.iter_mut() {
            if interface.treat_keyword(key, &mut self.engine.stream)? {
                trace!(keyword = %key, interface = interface.name(), "keyword handled by interface");
                return Ok(());
            }
        }
        Err(ParseError::new(
            "BehaviourDsl::treat_unknown_keyword",
            format!("unknown keyword (read '{key}')"),
            Some(line),
        ))
    }

    /// Targets generated by this compilation, dependency completion
    /// applied. The behaviour's own library is registered first so the
    /// completion pass can add cross-dependencies on imported targets.
    pub fn targets_description(&mut self) -> Result<TargetsDescription, ParseError> {
        let name = self.library_name();
        let lib = self.engine.targets.library_mut(&name);
        if !self.mb.behaviour_name().is_empty() {
            let source = format!("{}.cxx", self.mb.behaviour_name());
            if !lib.sources.contains(&source) {
                lib.sources.push(source);
                lib.entry_points.push(self.mb.behaviour_name().to_owned());
            }
        }
        for f in &self.link_flags {
            if !lib.ldflags.contains(f) {
                lib.ldflags.push(f.clone());
            }
        }
        self.engine.complete_targets_description()?;
        Ok(self.engine.targets().clone())
    }

    fn library_name(&self) -> String {
        if self.mb.library().is_empty() {
            "MaterialBehaviour".to_owned()
        } else {
            self.mb.library().to_owned()
        }
    }

    // =========================================================================
    // Keyword registration
    // =========================================================================

    fn register(&mut self, key: &'static str, handler: Handler<Self>) {
        self.callbacks.insert(key, handler);
    }

    fn register_default_callbacks(&mut self) {
        self.register(";", Self::treat_lonely_separator);
        self.register("@Author", Self::treat_author);
        self.register("@Date", Self::treat_date);
        self.register("@Description", Self::treat_description);
        self.register("@Parser", Self::treat_parser);
        self.register("@DSL", Self::treat_parser);
        self.register("@Behaviour", Self::treat_behaviour);
        self.register("@Material", Self::treat_material);
        self.register("@Library", Self::treat_library);
        self.register("@Includes", Self::treat_includes);
        self.register("@Sources", Self::treat_sources);
        self.register("@Members", Self::treat_members);
        self.register("@Private", Self::treat_private);
        self.register("@StaticVar", Self::treat_static_var);
        self.register("@StaticVariable", Self::treat_static_var);
        self.register("@IntegerConstant", Self::treat_integer_constant);
        self.register("@MaterialProperty", Self::treat_material_property);
        self.register("@Coef", Self::treat_material_property);
        self.register("@StateVariable", Self::treat_state_variable);
        self.register("@StateVar", Self::treat_state_variable);
        self.register("@AuxiliaryStateVariable", Self::treat_auxiliary_state_variable);
        self.register("@ExternalStateVariable", Self::treat_external_state_variable);
        self.register("@LocalVariable", Self::treat_local_variable);
        self.register("@LocalVar", Self::treat_local_variable);
        self.register("@Parameter", Self::treat_parameter);
        self.register("@UseQt", Self::treat_use_qt);
        self.register("@OutOfBoundsPolicy", Self::treat_out_of_bounds_policy);
        self.register("@Bounds", Self::treat_bounds);
        self.register("@PhysicalBounds", Self::treat_physical_bounds);
        self.register("@IsotropicBehaviour", Self::treat_isotropic_behaviour);
        self.register("@OrthotropicBehaviour", Self::treat_orthotropic_behaviour);
        self.register(
            "@IsotropicElasticBehaviour",
            Self::treat_isotropic_elastic_behaviour,
        );
        self.register("@ModellingHypothesis", Self::treat_modelling_hypothesis);
        self.register("@ModellingHypotheses", Self::treat_modelling_hypotheses);
        self.register("@RequireStiffnessTensor", Self::treat_require_stiffness_tensor);
        self.register(
            "@RequireThermalExpansionCoefficientTensor",
            Self::treat_require_thermal_expansion_tensor,
        );
        self.register(
            "@UsableInPurelyImplicitResolution",
            Self::treat_usable_in_purely_implicit_resolution,
        );
        self.register("@MainVariable", Self::treat_main_variable);
        self.register("@Interface", Self::treat_interface);
        self.register("@MaterialLaw", Self::treat_material_law);
        self.register("@MFront", Self::treat_mfront);
        self.register("@Import", Self::treat_import);
        self.register("@Link", Self::treat_link);
    }

    // =========================================================================
    // Metadata and structure keywords
    // =========================================================================

    fn treat_lonely_separator(&mut self) -> Result<(), ParseError> {
        self.engine.treat_lonely_separator();
        Ok(())
    }

    fn treat_author(&mut self) -> Result<(), ParseError> {
        self.engine.treat_author()
    }

    fn treat_date(&mut self) -> Result<(), ParseError> {
        self.engine.treat_date()
    }

    fn treat_description(&mut self) -> Result<(), ParseError> {
        self.engine.treat_description()
    }

    /// The DSL was already selected from this keyword by the driver.
    fn treat_parser(&mut self) -> Result<(), ParseError> {
        self.engine
            .stream
            .read_until_end_of_instruction("BehaviourDsl::treat_parser")?;
        Ok(())
    }

    fn treat_behaviour(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_behaviour";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(
                M,
                format!("invalid behaviour name '{name}'"),
            ));
        }
        self.mb.set_behaviour_name(name.clone())?;
        self.engine.set_class_name(name.clone());
        self.engine.names.reserve(name)?;
        Ok(())
    }

    fn treat_material(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_material";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(
                M,
                format!("invalid material name '{name}'"),
            ));
        }
        self.mb.set_material_name(name.as_str())
    }

    fn treat_library(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_library";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(
                M,
                format!("invalid library name '{name}'"),
            ));
        }
        self.mb.set_library(name.as_str())
    }

    // =========================================================================
    // Code blocks
    // =========================================================================

    fn code_block_options(&self, qualify: bool) -> CodeBlockOptions {
        let mut options = CodeBlockOptions::default();
        options.qualify_static_variables = qualify;
        options.qualify_member_variables = qualify;
        options.member_names = self.mb.member_names().cloned().collect();
        options.static_member_names = self.mb.static_variable_names().cloned().collect();
        options
    }

    fn treat_includes(&mut self) -> Result<(), ParseError> {
        let mut options = CodeBlockOptions::default();
        let block = self.engine.read_next_block(&mut options)?;
        self.mb.append_to_includes(&block.code);
        Ok(())
    }

    fn treat_sources(&mut self) -> Result<(), ParseError> {
        let mut options = CodeBlockOptions::default();
        let block = self.engine.read_next_block(&mut options)?;
        self.mb.append_to_sources(&block.code);
        Ok(())
    }

    fn treat_members(&mut self) -> Result<(), ParseError> {
        let mut options = self.code_block_options(true);
        let block = self.engine.read_next_block(&mut options)?;
        self.mb.append_to_members(&block.code);
        Ok(())
    }

    fn treat_private(&mut self) -> Result<(), ParseError> {
        let mut options = self.code_block_options(true);
        let block = self.engine.read_next_block(&mut options)?;
        self.mb.append_to_private_code(&block.code);
        Ok(())
    }

    // =========================================================================
    // Variables
    // =========================================================================

    fn treat_static_var(&mut self) -> Result<(), ParseError> {
        let v = self.engine.treat_static_var()?;
        self.engine.names.reserve(v.name.clone())?;
        self.mb.add_static_variable(v);
        Ok(())
    }

    fn treat_integer_constant(&mut self) -> Result<(), ParseError> {
        let v = self.engine.treat_integer_constant()?;
        self.engine.names.reserve(v.name.clone())?;
        self.mb.add_static_variable(v);
        Ok(())
    }

    fn treat_material_property(&mut self) -> Result<(), ParseError> {
        self.treat_variables(VariableCategory::MaterialProperty)
    }

    fn treat_state_variable(&mut self) -> Result<(), ParseError> {
        self.treat_variables(VariableCategory::StateVariable)
    }

    fn treat_auxiliary_state_variable(&mut self) -> Result<(), ParseError> {
        self.treat_variables(VariableCategory::AuxiliaryStateVariable)
    }

    fn treat_external_state_variable(&mut self) -> Result<(), ParseError> {
        self.treat_variables(VariableCategory::ExternalStateVariable)
    }

    fn treat_local_variable(&mut self) -> Result<(), ParseError> {
        self.treat_variables(VariableCategory::LocalVariable)
    }

    fn treat_variables(&mut self, category: VariableCategory) -> Result<(), ParseError> {
        let vars = self.engine.read_var_list(true)?;
        self.mb
            .register_variables(&mut self.engine.names, vars, category)
    }

    fn treat_parameter(&mut self) -> Result<(), ParseError> {
        let (vars, defaults) = self.engine.handle_parameter()?;
        self.mb
            .register_variables(&mut self.engine.names, vars, VariableCategory::Parameter)?;
        for (name, value) in defaults {
            self.mb.set_parameter_default_value(name, value)?;
        }
        Ok(())
    }

    // =========================================================================
    // Generation attributes
    // =========================================================================

    fn treat_use_qt(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_use_qt";
        let b = self.engine.stream.read_boolean_value(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_use_qt(b);
        Ok(())
    }

    fn treat_out_of_bounds_policy(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_out_of_bounds_policy";
        let policy = self.engine.stream.read_only_one_token(M)?;
        set_default_out_of_bounds_policy(self.mb.attributes_mut(), &policy)
    }

    fn treat_bounds(&mut self) -> Result<(), ParseError> {
        let b = read_bounds(&mut self.engine, false)?;
        self.mb.add_bounds(b)
    }

    fn treat_physical_bounds(&mut self) -> Result<(), ParseError> {
        let b = read_bounds(&mut self.engine, true)?;
        self.mb.add_bounds(b)
    }

    fn treat_isotropic_behaviour(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_isotropic_behaviour";
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_symmetry_type(SymmetryType::Isotropic);
        Ok(())
    }

    fn treat_orthotropic_behaviour(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_orthotropic_behaviour";
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_symmetry_type(SymmetryType::Orthotropic);
        Ok(())
    }

    fn treat_isotropic_elastic_behaviour(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_isotropic_elastic_behaviour";
        self.engine.stream.read_specified_token(M, ";")?;
        if self.mb.symmetry_type() != SymmetryType::Orthotropic {
            return Err(ParseError::semantic(
                M,
                "this keyword is only valid for orthotropic behaviours",
            ));
        }
        self.mb.set_elastic_symmetry_type(SymmetryType::Isotropic);
        Ok(())
    }

    fn treat_modelling_hypothesis(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_modelling_hypothesis";
        let line = self.engine.stream.current_line().unwrap_or(0);
        let value = self.engine.stream.read_only_one_token(M)?;
        let h = ModellingHypothesis::parse(&value, M, line)?;
        self.mb.set_hypotheses([h])
    }

    fn treat_modelling_hypotheses(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_modelling_hypotheses";
        let items = self.engine.stream.read_list(M, "{", "}", false)?;
        self.engine.stream.read_specified_token(M, ";")?;
        let mut hypotheses = Vec::with_capacity(items.len());
        for t in &items {
            let name = if t.flag == TokenFlag::String {
                t.string_content()
            } else {
                t.value.as_str()
            };
            hypotheses.push(ModellingHypothesis::parse(name, M, t.line)?);
        }
        self.mb.set_hypotheses(hypotheses)
    }

    fn treat_require_stiffness_tensor(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_require_stiffness_tensor";
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_requires_stiffness_operator(true);
        Ok(())
    }

    fn treat_require_thermal_expansion_tensor(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_require_thermal_expansion_tensor";
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_requires_thermal_expansion_tensor(true);
        Ok(())
    }

    fn treat_usable_in_purely_implicit_resolution(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_usable_in_purely_implicit_resolution";
        self.engine.stream.read_specified_token(M, ";")?;
        self.mb.set_usable_in_purely_implicit_resolution(true);
        Ok(())
    }

    /// `@MainVariable <type> <name>, <type> <name>;` declares a driving
    /// variable and its conjugated force.
    fn treat_main_variable(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_main_variable";
        let dv_type = self.engine.read_type_name()?;
        let dv_name = self.read_declared_name(M)?;
        self.engine.stream.read_specified_token(M, ",")?;
        let tf_type = self.engine.read_type_name()?;
        let tf_name = self.read_declared_name(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        self.engine.names.reserve(dv_name.clone())?;
        self.engine.names.reserve(tf_name.clone())?;
        self.mb.add_main_variable(
            DrivingVariable {
                name: dv_name,
                type_name: dv_type,
                increment_known: true,
            },
            ThermodynamicForce {
                name: tf_name,
                type_name: tf_type,
            },
        )
    }

    fn read_declared_name(&mut self, m: &str) -> Result<SmolStr, ParseError> {
        let t = self.engine.stream.current_or(m, "expected a name.")?;
        let name = t.value.clone();
        if !is_valid_identifier(&name) {
            return Err(ParseError::new(
                m,
                format!("invalid name '{name}'"),
                Some(t.line),
            ));
        }
        self.engine.stream.advance();
        Ok(name)
    }

    // =========================================================================
    // Interfaces, imports, targets
    // =========================================================================

    /// `@Interface a[,b...];` instantiates generators from the registry.
    fn treat_interface(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_interface";
        loop {
            let t = self.engine.stream.current_or(M, "expected an interface name.")?;
            let name = t.value.to_string();
            if name == ";" {
                return Err(ParseError::new(M, "no interface given", Some(t.line)));
            }
            if self.interfaces.iter().any(|i| i.name() == name) {
                return Err(ParseError::new(
                    M,
                    format!("interface '{name}' already specified"),
                    Some(t.line),
                ));
            }
            self.interfaces.push(self.registry.create(&name)?);
            self.engine.stream.advance();
            let (separator, separator_line) = {
                let t = self.engine.stream.current_or(M, "expected ',' or ';'")?;
                (t.value.clone(), t.line)
            };
            match separator.as_str() {
                "," => self.engine.stream.advance(),
                ";" => {
                    self.engine.stream.advance();
                    return Ok(());
                }
                other => {
                    return Err(ParseError::new(
                        M,
                        format!("expected ',' or ';', read '{other}'"),
                        Some(separator_line),
                    ));
                }
            }
        }
    }

    fn treat_material_law(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_material_law";
        let files = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        for f in files {
            let imported = import_material_law(&mut self.engine, &f)?;
            trace!(law = imported.description.law_name(), "imported material law");
            self.mb.append_to_includes(&imported.include_directive);
        }
        Ok(())
    }

    /// `@MFront {files[, interfaces]};` compiles other DSL files and merges
    /// their targets into this compilation.
    fn treat_mfront(&mut self) -> Result<(), ParseError> {
        super::treat_mfront_statement(&mut self.engine)
    }

    /// `@Import "file";` re-enters the tokenizer on the named files against
    /// this same DSL instance; the enclosing source position is restored on
    /// every exit path.
    fn treat_import(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_import";
        let files = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        for f in files {
            let path = self
                .engine
                .options
                .search
                .search(&f)
                .map_err(|e| ParseError::semantic(M, e.to_string()))?;
            let saved = self.engine.save_source();
            let result = self
                .engine
                .open_file(&path, &[], &rustc_hash::FxHashMap::default())
                .map_err(|e| ParseError::semantic(M, e.to_string()))
                .and_then(|()| self.analyse_tokens());
            self.engine.restore_source(saved);
            result.map_err(|e| {
                ParseError::semantic(M, format!("error while importing '{f}'\n{e}"))
            })?;
        }
        Ok(())
    }

    fn treat_link(&mut self) -> Result<(), ParseError> {
        const M: &str = "BehaviourDsl::treat_link";
        let flags = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        self.link_flags.extend(flags);
        Ok(())
    }
}
