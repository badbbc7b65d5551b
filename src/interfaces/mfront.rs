//! Generic material-property interface
//!
//! Generates the plain C++ function other generated code links against,
//! and provides the function and file naming scheme used when a behaviour
//! imports a material law.

use std::fmt::Write as _;

use tracing::debug;

use crate::model::{FileDescription, MaterialPropertyDescription, StaticVariableValue};
use crate::parser::error::{DslError, ParseError};
use crate::parser::stream::TokenStream;
use crate::project::CompilerOptions;

use super::targets::TargetsDescription;
use super::{MaterialPropertyInterface, argument_list, include_guard};

/// Library collecting all generic material-law functions.
const LIBRARY: &str = "MaterialLaws";

pub struct MfrontMaterialPropertyInterface;

impl MfrontMaterialPropertyInterface {
    pub fn new() -> Self {
        Self
    }

    /// Function name of a material law: `<material>_<law>`, or `<law>` when
    /// no material is set.
    pub fn function_name(material: &str, law: &str) -> String {
        if material.is_empty() {
            law.to_owned()
        } else {
            format!("{material}_{law}")
        }
    }

    /// Stem of the generated header file.
    pub fn header_file_name(material: &str, law: &str) -> String {
        format!("{}-mfront", Self::function_name(material, law))
    }

    /// Stem of the generated source file.
    pub fn source_file_name(material: &str, law: &str) -> String {
        format!("{}-mfront", Self::function_name(material, law))
    }
}

impl Default for MfrontMaterialPropertyInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPropertyInterface for MfrontMaterialPropertyInterface {
    fn name(&self) -> &'static str {
        "mfront"
    }

    fn get_targets_description(
        &self,
        td: &mut TargetsDescription,
        mpd: &MaterialPropertyDescription,
    ) {
        let name = mpd.material_law_name();
        let lib = td.library_mut(LIBRARY);
        lib.sources.push(format!("{name}-mfront.cxx"));
        lib.entry_points.push(name.clone());
        td.headers.push(format!("{name}-mfront.hxx"));
    }

    fn treat_keyword(
        &mut self,
        _key: &str,
        _stream: &mut TokenStream,
    ) -> Result<bool, ParseError> {
        Ok(false)
    }

    fn write_output_files(
        &self,
        mpd: &MaterialPropertyDescription,
        fd: &FileDescription,
        options: &CompilerOptions,
    ) -> Result<(), DslError> {
        let name = mpd.material_law_name();
        debug!(law = %name, "writing mfront interface files");
        write_header(mpd, fd, options, &name)?;
        write_source(mpd, fd, options, &name)?;
        Ok(())
    }
}

fn write_header(
    mpd: &MaterialPropertyDescription,
    fd: &FileDescription,
    options: &CompilerOptions,
    name: &str,
) -> Result<(), DslError> {
    let guard = include_guard(&format!("{name}-mfront"));
    let args = argument_list(mpd);
    let mut out = String::new();
    let _ = writeln!(out, "/*!");
    let _ = writeln!(out, " * \\file {name}-mfront.hxx");
    let _ = writeln!(out, " * \\brief generated from {}", fd.file_name);
    if !fd.author.is_empty() {
        let _ = writeln!(out, " * \\author {}", fd.author);
    }
    if !fd.date.is_empty() {
        let _ = writeln!(out, " * \\date {}", fd.date);
    }
    let _ = writeln!(out, " */");
    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    let _ = writeln!(out);
    let _ = writeln!(out, "#ifdef __cplusplus");
    let _ = writeln!(out, "extern \"C\" {{");
    let _ = writeln!(out, "#endif /* __cplusplus */");
    let _ = writeln!(out);
    let _ = writeln!(out, "double {name}({args});");
    let _ = writeln!(out, "int {name}_checkBounds({args});");
    let _ = writeln!(out);
    let _ = writeln!(out, "#ifdef __cplusplus");
    let _ = writeln!(out, "}} /* extern \"C\" */");
    let _ = writeln!(out, "#endif /* __cplusplus */");
    let _ = writeln!(out);
    let _ = writeln!(out, "#endif /* {guard} */");
    let path = options.output_directory.join(format!("{name}-mfront.hxx"));
    std::fs::write(&path, out).map_err(|e| DslError::output(path, e))
}

fn write_source(
    mpd: &MaterialPropertyDescription,
    fd: &FileDescription,
    options: &CompilerOptions,
    name: &str,
) -> Result<(), DslError> {
    let args = argument_list(mpd);
    let output = mpd.output_name();
    let mut out = String::new();
    let _ = writeln!(out, "/*!");
    let _ = writeln!(out, " * \\file {name}-mfront.cxx");
    let _ = writeln!(out, " * \\brief generated from {}", fd.file_name);
    let _ = writeln!(out, " */");
    let _ = writeln!(out, "#include <cmath>");
    let _ = writeln!(out, "#include <cerrno>");
    if !mpd.includes().is_empty() {
        let _ = writeln!(out, "{}", mpd.includes());
    }
    let _ = writeln!(out, "#include \"{name}-mfront.hxx\"");
    let _ = writeln!(out);
    let _ = writeln!(out, "double {name}({args})");
    let _ = writeln!(out, "{{");
    let _ = writeln!(out, "using namespace std;");
    for v in mpd.static_variables() {
        match v.value {
            StaticVariableValue::Int(i) => {
                let _ = writeln!(out, "static constexpr int {} = {i};", v.name);
            }
            StaticVariableValue::Real(r) => {
                let _ = writeln!(out, "static constexpr double {} = {r:e};", v.name);
            }
        }
    }
    for p in mpd.parameters() {
        if let Some(value) = mpd.parameters_values().get(&p.name) {
            let _ = writeln!(out, "static constexpr double {} = {value:e};", p.name);
        }
    }
    let _ = writeln!(out, "double {output};");
    let _ = writeln!(out, "{}", mpd.function().code);
    let _ = writeln!(out, "return {output};");
    let _ = writeln!(out, "}} /* end of {name} */");
    let _ = writeln!(out);
    let _ = writeln!(out, "int {name}_checkBounds({args})");
    let _ = writeln!(out, "{{");
    write_bounds_checks(&mut out, mpd);
    let _ = writeln!(out, "return 0;");
    let _ = writeln!(out, "}} /* end of {name}_checkBounds */");
    let path = options.output_directory.join(format!("{name}-mfront.cxx"));
    std::fs::write(&path, out).map_err(|e| DslError::output(path, e))
}

/// One failing status per bounded input, physical bounds first.
pub(crate) fn write_bounds_checks(out: &mut String, mpd: &MaterialPropertyDescription) {
    let mut status = 0i32;
    for b in mpd.bounds() {
        status -= 1;
        if b.lower_bound.is_finite() {
            let _ = writeln!(out, "if({} < {:e}){{", b.name, b.lower_bound);
            let _ = writeln!(out, "return {status};");
            let _ = writeln!(out, "}}");
        }
        if b.upper_bound.is_finite() {
            let _ = writeln!(out, "if({} > {:e}){{", b.name, b.upper_bound);
            let _ = writeln!(out, "return {status};");
            let _ = writeln!(out, "}}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_name() {
        assert_eq!(
            MfrontMaterialPropertyInterface::function_name("UO2", "Young"),
            "UO2_Young"
        );
        assert_eq!(
            MfrontMaterialPropertyInterface::function_name("", "Young"),
            "Young"
        );
        assert_eq!(
            MfrontMaterialPropertyInterface::header_file_name("UO2", "Young"),
            "UO2_Young-mfront"
        );
    }

    #[test]
    fn test_targets_description() {
        let mut mpd = MaterialPropertyDescription::new();
        mpd.set_law_name("Young").unwrap();
        let i = MfrontMaterialPropertyInterface::new();
        let mut td = TargetsDescription::default();
        i.get_targets_description(&mut td, &mpd);
        let lib = td.library("MaterialLaws").unwrap();
        assert_eq!(lib.sources, ["Young-mfront.cxx"]);
        assert_eq!(lib.entry_points, ["Young"]);
        assert_eq!(td.headers, ["Young-mfront.hxx"]);
    }
}
