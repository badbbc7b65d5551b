//! Material-property DSL
//!
//! Interprets material-law files: the law and material names, inputs,
//! parameters with default values, and the `@Function` body computing the
//! output, mutating a [`MaterialPropertyDescription`].

use std::path::Path;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::interfaces::{InterfaceRegistry, MaterialPropertyInterface, TargetsDescription};
use crate::model::{
    MaterialPropertyDescription, StaticVariableDescription, StaticVariableValue,
    set_default_out_of_bounds_policy,
};
use crate::parser::code_block::CodeBlockOptions;
use crate::parser::engine::DslEngine;
use crate::parser::error::{DslError, ParseError};
use crate::parser::lexer::is_valid_identifier;
use crate::project::CompilerOptions;

use super::{Handler, import_material_law, read_bounds};

pub struct MaterialPropertyDsl {
    engine: DslEngine,
    mpd: MaterialPropertyDescription,
    registry: InterfaceRegistry,
    interfaces: Vec<Box<dyn MaterialPropertyInterface>>,
    callbacks: IndexMap<&'static str, Handler<Self>>,
    link_flags: Vec<String>,
}

impl MaterialPropertyDsl {
    pub fn new(options: CompilerOptions) -> Self {
        let mut dsl = Self {
            engine: DslEngine::new(options),
            mpd: MaterialPropertyDescription::new(),
            registry: InterfaceRegistry::with_builtin_interfaces(),
            interfaces: Vec::new(),
            callbacks: IndexMap::new(),
            link_flags: Vec::new(),
        };
        dsl.register_default_callbacks();
        dsl
    }

    pub fn description(&self) -> &MaterialPropertyDescription {
        &self.mpd
    }

    pub fn into_description(self) -> MaterialPropertyDescription {
        self.mpd
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
        if self.mpd.law_name().is_empty() {
            return Err(ParseError::semantic(
                "MaterialPropertyDsl::analyse",
                "no law name given",
            ));
        }
        if !self.mpd.has_function() {
            return Err(ParseError::semantic(
                "MaterialPropertyDsl::analyse",
                "no function defined",
            ));
        }
        Ok(())
    }

    fn treat_unknown_keyword(&mut self, key: &str, line: u32) -> Result<(), ParseError> {
        for interface in self.interfaces.iter_mut() {
            if interface.treat_keyword(key, &mut self.engine.stream)? {
                trace!(keyword = %key, interface = interface.name(), "keyword handled by interface");
                return Ok(());
            }
        }
        Err(ParseError::new(
            "MaterialPropertyDsl::treat_unknown_keyword",
            format!("unknown keyword (read '{key}')"),
            Some(line),
        ))
    }

    /// Targets generated by this compilation, dependency completion
    /// applied. Interface targets are folded into the compilation's
    /// targets first so the completion pass can add cross-dependencies on
    /// imported targets.
    pub fn targets_description(&mut self) -> Result<TargetsDescription, ParseError> {
        let mut interface_targets = TargetsDescription::default();
        for interface in &self.interfaces {
            interface.get_targets_description(&mut interface_targets, &self.mpd);
        }
        crate::interfaces::merge_targets_description(&mut self.engine.targets, &interface_targets)?;
        self.engine.complete_targets_description()?;
        let mut td = self.engine.targets().clone();
        for lib in td.libraries_mut() {
            for f in &self.link_flags {
                if !lib.ldflags.contains(f) {
                    lib.ldflags.push(f.clone());
                }
            }
        }
        Ok(td)
    }

    /// Ask every interface to write its output files.
    pub fn write_output_files(&self) -> Result<(), DslError> {
        for interface in &self.interfaces {
            interface.write_output_files(&self.mpd, self.engine.file(), self.engine.options())?;
        }
        Ok(())
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
        self.register("@Law", Self::treat_law);
        self.register("@Material", Self::treat_material);
        self.register("@Includes", Self::treat_includes);
        self.register("@StaticVar", Self::treat_static_var);
        self.register("@StaticVariable", Self::treat_static_var);
        self.register("@IntegerConstant", Self::treat_integer_constant);
        self.register("@Constant", Self::treat_constant);
        self.register("@Input", Self::treat_input);
        self.register("@Output", Self::treat_output);
        self.register("@Parameter", Self::treat_parameter);
        self.register("@Function", Self::treat_function);
        self.register("@Bounds", Self::treat_bounds);
        self.register("@PhysicalBounds", Self::treat_physical_bounds);
        self.register("@OutOfBoundsPolicy", Self::treat_out_of_bounds_policy);
        self.register("@Interface", Self::treat_interface);
        self.register("@MaterialLaw", Self::treat_material_law);
        self.register("@MFront", Self::treat_mfront);
        self.register("@Import", Self::treat_import);
        self.register("@Link", Self::treat_link);
    }

    // =========================================================================
    // Handlers
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

    fn treat_parser(&mut self) -> Result<(), ParseError> {
        self.engine
            .stream
            .read_until_end_of_instruction("MaterialPropertyDsl::treat_parser")?;
        Ok(())
    }

    fn treat_law(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_law";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(M, format!("invalid law name '{name}'")));
        }
        self.mpd.set_law_name(name.as_str())?;
        self.engine.set_class_name(name);
        Ok(())
    }

    fn treat_material(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_material";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(
                M,
                format!("invalid material name '{name}'"),
            ));
        }
        self.mpd.set_material_name(name.as_str())
    }

    fn treat_includes(&mut self) -> Result<(), ParseError> {
        let mut options = CodeBlockOptions::default();
        let block = self.engine.read_next_block(&mut options)?;
        self.mpd.append_to_includes(&block.code);
        Ok(())
    }

    fn treat_static_var(&mut self) -> Result<(), ParseError> {
        let v = self.engine.treat_static_var()?;
        self.engine.names.reserve(v.name.clone())?;
        self.mpd.add_static_variable(v);
        Ok(())
    }

    fn treat_integer_constant(&mut self) -> Result<(), ParseError> {
        let v = self.engine.treat_integer_constant()?;
        self.engine.names.reserve(v.name.clone())?;
        self.mpd.add_static_variable(v);
        Ok(())
    }

    /// `@Constant name = value;` declares a real constant.
    fn treat_constant(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_constant";
        let t = self.engine.stream.current_or(M, "expected a constant name.")?;
        let name = t.value.clone();
        let line = t.line;
        if !is_valid_identifier(&name) {
            return Err(ParseError::new(
                M,
                format!("constant name '{name}' is not valid."),
                Some(line),
            ));
        }
        self.engine.stream.advance();
        let value = self
            .engine
            .read_initialisation_value_f64(M, &name, true)?
            .unwrap_or_else(|| unreachable!("mandatory initialisation value"));
        self.engine.stream.read_specified_token(M, ";")?;
        self.engine.names.reserve(name.clone())?;
        self.mpd.add_static_variable(StaticVariableDescription::new(
            "real",
            name,
            line,
            StaticVariableValue::Real(value),
        ));
        Ok(())
    }

    /// Inputs are scalar `real` quantities, no arrays.
    fn treat_input(&mut self) -> Result<(), ParseError> {
        let vars = self
            .engine
            .read_var_list_with_type(SmolStr::new_static("real"), false)?;
        self.mpd.register_inputs(&mut self.engine.names, vars)
    }

    fn treat_output(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_output";
        let name = self.engine.stream.read_only_one_token(M)?;
        if !is_valid_identifier(&name) {
            return Err(ParseError::semantic(
                M,
                format!("invalid output name '{name}'"),
            ));
        }
        self.engine.names.reserve(name.clone())?;
        self.mpd.set_output_name(name)
    }

    fn treat_parameter(&mut self) -> Result<(), ParseError> {
        let (vars, defaults) = self.engine.handle_parameter()?;
        self.mpd.register_parameters(&mut self.engine.names, vars)?;
        for (name, value) in defaults {
            self.mpd.set_parameter_default_value(name, value)?;
        }
        Ok(())
    }

    /// The function body computing the output. Input and parameter names
    /// are tracked as members but emitted unqualified.
    fn treat_function(&mut self) -> Result<(), ParseError> {
        let mut options = CodeBlockOptions::default();
        options.member_names = self
            .mpd
            .inputs()
            .iter()
            .chain(self.mpd.parameters())
            .map(|v| v.name.clone())
            .chain([SmolStr::new(self.mpd.output_name())])
            .collect();
        options.static_member_names = self
            .mpd
            .static_variables()
            .iter()
            .map(|v| v.name.clone())
            .collect();
        let block = self.engine.read_next_block(&mut options)?;
        self.mpd.set_function(block)
    }

    fn treat_bounds(&mut self) -> Result<(), ParseError> {
        let b = read_bounds(&mut self.engine, false)?;
        self.mpd.add_bounds(b)
    }

    fn treat_physical_bounds(&mut self) -> Result<(), ParseError> {
        let b = read_bounds(&mut self.engine, true)?;
        self.mpd.add_bounds(b)
    }

    fn treat_out_of_bounds_policy(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_out_of_bounds_policy";
        let policy = self.engine.stream.read_only_one_token(M)?;
        set_default_out_of_bounds_policy(self.mpd.attributes_mut(), &policy)
    }

    fn treat_interface(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_interface";
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

    /// `@MFront {files[, interfaces]};` compiles other DSL files and merges
    /// their targets into this compilation.
    fn treat_mfront(&mut self) -> Result<(), ParseError> {
        super::treat_mfront_statement(&mut self.engine)
    }

    fn treat_material_law(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_material_law";
        let files = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        for f in files {
            let imported = import_material_law(&mut self.engine, &f)?;
            trace!(law = imported.description.law_name(), "imported material law");
            self.mpd.append_to_includes(&imported.include_directive);
        }
        Ok(())
    }

    fn treat_import(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_import";
        let files = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        for f in files {
            let path = self
                .engine
                .options
                .search
                .search(&f)
                .map_err(|e| ParseError::semantic(M, e.to_string()))?;
            debug!(file = %path.display(), "importing DSL file");
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

    fn treat_link(&mut self) -> Result<(), ParseError> {
        const M: &str = "MaterialPropertyDsl::treat_link";
        let flags = self.engine.stream.read_string_or_array_of_string(M)?;
        self.engine.stream.read_specified_token(M, ";")?;
        self.link_flags.extend(flags);
        Ok(())
    }
}
