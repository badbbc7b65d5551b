//! Whole-file analysis driver
//!
//! Entry point of one compilation: peek the `@Parser`/`@DSL` declaration to
//! pick the DSL variant, run the full parse, and collect the targets
//! description. Recursive imports (`@MFront`, `@MaterialLaw`) re-enter this
//! driver on the imported files.

use std::path::Path;

use tracing::debug;

use crate::dsl::{BehaviourDsl, MaterialPropertyDsl};
use crate::interfaces::TargetsDescription;
use crate::parser::error::{DslError, ParseError};
use crate::parser::lexer::{TokenFlag, tokenize};

use super::options::CompilerOptions;

/// The outcome of analysing one DSL file.
pub enum Analysis {
    Behaviour(Box<BehaviourDsl>),
    MaterialProperty(Box<MaterialPropertyDsl>),
}

impl std::fmt::Debug for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Analysis::Behaviour(_) => f.write_str("Analysis::Behaviour"),
            Analysis::MaterialProperty(_) => f.write_str("Analysis::MaterialProperty"),
        }
    }
}

/// Scan a file's token stream for `@Keyword value;` statements without
/// interpreting it.
///
/// Returns one value per requested keyword, empty when the keyword is
/// absent. Each matched keyword must begin an instruction and be followed
/// by exactly one value and a `;`.
pub fn read_specified_values(path: &Path, keys: &[&str]) -> Result<Vec<String>, DslError> {
    const M: &str = "read_specified_values";
    let source = std::fs::read_to_string(path).map_err(|e| DslError::file(path, e))?;
    let tokens = tokenize(&source)?;
    let mut values = vec![String::new(); keys.len()];
    let mut i = 0;
    while i < tokens.len() {
        let Some(k) = keys.iter().position(|key| tokens[i].value == *key) else {
            i += 1;
            continue;
        };
        let key = keys[k];
        if i > 0 && tokens[i - 1].value != ";" {
            return Err(ParseError::new(
                M,
                format!("the keyword '{key}' does not begin a new instruction."),
                Some(tokens[i].line),
            )
            .into());
        }
        let value = tokens.get(i + 1).ok_or_else(|| {
            ParseError::new(
                M,
                format!("unexpected end of file (expected a value after '{key}')."),
                tokens.last().map(|t| t.line),
            )
        })?;
        if value.value == ";" {
            return Err(ParseError::new(
                M,
                format!("unexpected token ';' (expected a value after '{key}')."),
                Some(value.line),
            )
            .into());
        }
        let terminator = tokens.get(i + 2).ok_or_else(|| {
            ParseError::new(
                M,
                format!("unexpected end of file (expected ';' after '{key}')."),
                tokens.last().map(|t| t.line),
            )
        })?;
        if terminator.value != ";" {
            return Err(ParseError::new(
                M,
                format!("unexpected token '{}' (expected ';').", terminator.value),
                Some(terminator.line),
            )
            .into());
        }
        values[k] = if value.flag == TokenFlag::String {
            value.string_content().to_owned()
        } else {
            value.value.to_string()
        };
        i += 3;
    }
    Ok(values)
}

/// DSL variant named by a file, defaulting to the default behaviour DSL.
fn dsl_name_of(path: &Path) -> Result<String, DslError> {
    let values = read_specified_values(path, &["@Parser", "@DSL"])?;
    let name = values.into_iter().find(|v| !v.is_empty()).unwrap_or_default();
    Ok(name)
}

/// Analyse one DSL file with the requested interfaces instantiated.
pub fn analyse_file(
    path: &Path,
    interfaces: &[&str],
    options: &CompilerOptions,
) -> Result<Analysis, DslError> {
    let dsl_name = dsl_name_of(path)?;
    debug!(file = %path.display(), dsl = %dsl_name, "analysing DSL file");
    match dsl_name.as_str() {
        "" | "Default" | "DefaultDSL" | "DefaultParser" => {
            let mut dsl = BehaviourDsl::default_small_strain(options.clone())?;
            dsl.set_interfaces(interfaces)?;
            dsl.analyse_file(path)?;
            Ok(Analysis::Behaviour(Box::new(dsl)))
        }
        "Behaviour" | "BehaviourDSL" | "GenericBehaviour" => {
            let mut dsl = BehaviourDsl::generic(options.clone());
            dsl.set_interfaces(interfaces)?;
            dsl.analyse_file(path)?;
            Ok(Analysis::Behaviour(Box::new(dsl)))
        }
        "MaterialLaw" | "MaterialProperty" | "MaterialPropertyDSL" => {
            let mut dsl = MaterialPropertyDsl::new(options.clone());
            dsl.set_interfaces(interfaces)?;
            dsl.analyse_file(path)?;
            Ok(Analysis::MaterialProperty(Box::new(dsl)))
        }
        other => Err(ParseError::new(
            "analyse_file",
            format!("unknown dsl '{other}'"),
            None,
        )
        .into()),
    }
}

/// Analyse one file and return its completed targets description.
pub fn treat_file(
    path: &Path,
    interfaces: &[&str],
    options: &CompilerOptions,
) -> Result<TargetsDescription, DslError> {
    match analyse_file(path, interfaces, options)? {
        Analysis::Behaviour(mut dsl) => Ok(dsl.targets_description()?),
        Analysis::MaterialProperty(mut dsl) => Ok(dsl.targets_description()?),
    }
}

/// Analyse one file, write the generated output files, and return the
/// targets description. Targets are collected before any file is written.
pub fn generate(
    path: &Path,
    interfaces: &[&str],
    options: &CompilerOptions,
) -> Result<TargetsDescription, DslError> {
    match analyse_file(path, interfaces, options)? {
        Analysis::Behaviour(mut dsl) => Ok(dsl.targets_description()?),
        Analysis::MaterialProperty(mut dsl) => {
            let targets = dsl.targets_description()?;
            dsl.write_output_files()?;
            Ok(targets)
        }
    }
}
