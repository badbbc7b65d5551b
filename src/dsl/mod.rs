//! DSL variants
//!
//! A DSL variant wires a keyword table to the base engine and owns the
//! description model its handlers mutate. Registration happens at
//! construction time into a per-instance table; there is no global keyword
//! state.

pub mod behaviour_dsl;
pub mod material_property_dsl;

use smol_str::SmolStr;
use tracing::debug;

use crate::interfaces::mfront::MfrontMaterialPropertyInterface;
use crate::model::{BoundsDescription, MaterialPropertyDescription};
use crate::parser::engine::DslEngine;
use crate::parser::error::ParseError;
use crate::parser::lexer::is_valid_identifier;
use crate::project::driver;

pub use behaviour_dsl::BehaviourDsl;
pub use material_property_dsl::MaterialPropertyDsl;

/// A keyword handler. Handlers are registered per DSL instance at
/// construction time.
pub type Handler<D> = fn(&mut D) -> Result<(), ParseError>;

/// Result of importing a material-law file into an enclosing compilation.
pub(crate) struct ImportedMaterialLaw {
    pub description: MaterialPropertyDescription,
    /// Include directive for the generated header
    pub include_directive: String,
}

/// Compile a material-law file referenced by `@MaterialLaw` and record its
/// effects on the enclosing compilation: the generated function name and
/// its two auxiliary names are reserved, the law is registered, and the
/// imported targets are kept for the dependency-completion pass.
///
/// Any nested failure is re-raised as a single error naming the outer file
/// and embedding the inner message.
pub(crate) fn import_material_law(
    engine: &mut DslEngine,
    file: &str,
) -> Result<ImportedMaterialLaw, ParseError> {
    const M: &str = "import_material_law";
    let outer_file = engine.file_name().to_owned();
    let line = engine.stream.current_line();
    let wrap = |message: String| {
        ParseError::new(
            M,
            format!("error in '{outer_file}' while treating file '{file}'\n{message}"),
            line,
        )
    };
    let path = engine
        .options
        .search
        .search(file)
        .map_err(|e| wrap(e.to_string()))?;
    debug!(file = %path.display(), "importing material law");
    let analysis = driver::analyse_file(&path, &["mfront"], &engine.options)
        .map_err(|e| wrap(e.to_string()))?;
    let driver::Analysis::MaterialProperty(mut dsl) = analysis else {
        return Err(wrap("file does not describe a material law".to_owned()));
    };
    let targets = dsl.targets_description().map_err(|e| wrap(e.to_string()))?;
    if !targets.specific_targets.is_empty() {
        return Err(wrap("specific targets are not supported".to_owned()));
    }
    let mpd = dsl.into_description();

    let function =
        MfrontMaterialPropertyInterface::function_name(mpd.material_name(), mpd.law_name());
    engine
        .names
        .reserve(function.clone())
        .map_err(|e| wrap(e.to_string()))?;
    engine
        .names
        .reserve(format!("{function}_checkBounds"))
        .map_err(|e| wrap(e.to_string()))?;
    engine
        .names
        .reserve(format!("{function}_bounds_check_status"))
        .map_err(|e| wrap(e.to_string()))?;
    engine.material_laws.push(SmolStr::new(&function));
    engine.imported_targets.push(targets);

    let header =
        MfrontMaterialPropertyInterface::header_file_name(mpd.material_name(), mpd.law_name());
    Ok(ImportedMaterialLaw {
        description: mpd,
        include_directive: format!("#include\"{header}.hxx\""),
    })
}

/// Handle a `@MFront {files[, interfaces]};` statement: compile each file
/// through the driver with the requested interfaces and merge the resulting
/// targets into the enclosing compilation. Merging unions list attributes
/// and never overwrites.
pub(crate) fn treat_mfront_statement(engine: &mut DslEngine) -> Result<(), ParseError> {
    const M: &str = "treat_mfront";
    engine.stream.read_specified_token(M, "{")?;
    let files = engine.stream.read_string_or_array_of_string(M)?;
    let mut interfaces = Vec::new();
    let t = engine.stream.current_or(M, "expected '}'")?;
    if t.value != "}" && t.value != "," {
        return Err(ParseError::new(
            M,
            format!("expected ',' or '}}', read '{}'", t.value),
            Some(t.line),
        ));
    }
    if t.value == "," {
        engine.stream.advance();
        interfaces = engine.stream.read_string_or_array_of_string(M)?;
    }
    engine.stream.read_specified_token(M, "}")?;
    engine.stream.read_specified_token(M, ";")?;
    let interface_names: Vec<&str> = interfaces.iter().map(String::as_str).collect();
    for f in files {
        let path = engine
            .options
            .search
            .search(&f)
            .map_err(|e| ParseError::semantic(M, e.to_string()))?;
        debug!(file = %path.display(), "treating @MFront file");
        let td = driver::treat_file(&path, &interface_names, &engine.options).map_err(|e| {
            ParseError::semantic(M, format!("error while treating file '{f}'\n{e}"))
        })?;
        crate::interfaces::merge_targets_description(&mut engine.targets, &td)?;
    }
    Ok(())
}

/// Parse the tail of a `@Bounds`/`@PhysicalBounds` statement:
/// `name in [lower:upper];` where either bound may be `*`.
pub(crate) fn read_bounds(
    engine: &mut DslEngine,
    physical: bool,
) -> Result<BoundsDescription, ParseError> {
    const M: &str = "read_bounds";
    let t = engine.stream.current_or(M, "expected a variable name.")?;
    let name = t.value.clone();
    let line = t.line;
    if !is_valid_identifier(&name) {
        return Err(ParseError::new(
            M,
            format!("variable name '{name}' is not valid."),
            Some(line),
        ));
    }
    engine.stream.advance();
    engine.stream.read_specified_token(M, "in")?;
    engine.stream.read_specified_token(M, "[")?;
    let lower = read_bound_value(engine, M)?;
    engine.stream.read_specified_token(M, ":")?;
    let upper = read_bound_value(engine, M)?;
    engine.stream.read_specified_token(M, "]")?;
    engine.stream.read_specified_token(M, ";")?;
    let b = match (lower, upper) {
        (None, None) => {
            return Err(ParseError::new(
                M,
                format!("no bound given for '{name}'"),
                Some(line),
            ));
        }
        (Some(l), None) => BoundsDescription::lower(name, l, physical, line),
        (None, Some(u)) => BoundsDescription::upper(name, u, physical, line),
        (Some(l), Some(u)) => {
            if l > u {
                return Err(ParseError::new(
                    M,
                    format!("invalid bounds for '{name}' (lower bound exceeds upper bound)"),
                    Some(line),
                ));
            }
            BoundsDescription::range(name, l, u, physical, line)
        }
    };
    Ok(b)
}

fn read_bound_value(engine: &mut DslEngine, m: &str) -> Result<Option<f64>, ParseError> {
    if engine.stream.current().is_some_and(|t| t.value == "*") {
        engine.stream.advance();
        return Ok(None);
    }
    Ok(Some(engine.stream.read_double(m)?))
}
