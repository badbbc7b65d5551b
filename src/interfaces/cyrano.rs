//! Material-property interface for the Cyrano fuel-performance code
//!
//! Cyrano calls material properties through a fixed ABI: one function per
//! law taking the input values as an array. The generated source honours
//! the description's default out-of-bounds policy.

use std::fmt::Write as _;

use tracing::debug;

use crate::model::{
    FileDescription, MaterialPropertyDescription, OutOfBoundsPolicy, StaticVariableValue,
    default_out_of_bounds_policy,
};
use crate::parser::error::{DslError, ParseError};
use crate::parser::stream::TokenStream;
use crate::project::CompilerOptions;

use super::targets::TargetsDescription;
use super::{MaterialPropertyInterface, include_guard};

pub struct CyranoMaterialPropertyInterface;

impl CyranoMaterialPropertyInterface {
    pub fn new() -> Self {
        Self
    }

    /// Name of the function exported to Cyrano.
    pub fn cyrano_function_name(mpd: &MaterialPropertyDescription) -> String {
        format!("cyrano_{}", mpd.material_law_name())
    }

    fn header_file_name(mpd: &MaterialPropertyDescription) -> String {
        format!("{}-cyrano.hxx", mpd.material_law_name())
    }

    fn source_file_name(mpd: &MaterialPropertyDescription) -> String {
        format!("{}-cyrano.cxx", mpd.material_law_name())
    }
}

impl Default for CyranoMaterialPropertyInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPropertyInterface for CyranoMaterialPropertyInterface {
    fn name(&self) -> &'static str {
        "cyrano"
    }

    fn get_targets_description(
        &self,
        td: &mut TargetsDescription,
        mpd: &MaterialPropertyDescription,
    ) {
        let lib = td.library_mut("CyranoMaterialLaws");
        lib.sources.push(Self::source_file_name(mpd));
        lib.entry_points.push(Self::cyrano_function_name(mpd));
        td.headers.push(Self::header_file_name(mpd));
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
        let function = Self::cyrano_function_name(mpd);
        debug!(law = %mpd.material_law_name(), "writing cyrano interface files");
        let policy = default_out_of_bounds_policy(mpd.attributes())?;

        let guard = include_guard(&format!("{}-cyrano", mpd.material_law_name()));
        let mut header = String::new();
        let _ = writeln!(header, "/*!");
        let _ = writeln!(header, " * \\file {}", Self::header_file_name(mpd));
        let _ = writeln!(header, " * \\brief generated from {}", fd.file_name);
        let _ = writeln!(header, " */");
        let _ = writeln!(header, "#ifndef {guard}");
        let _ = writeln!(header, "#define {guard}");
        let _ = writeln!(header);
        let _ = writeln!(header, "#ifdef __cplusplus");
        let _ = writeln!(header, "extern \"C\" {{");
        let _ = writeln!(header, "#endif /* __cplusplus */");
        let _ = writeln!(header);
        let _ = writeln!(
            header,
            "double {function}(const double* const cyrano_params);"
        );
        let _ = writeln!(
            header,
            "int {function}_checkBounds(const double* const cyrano_params);"
        );
        let _ = writeln!(header);
        let _ = writeln!(header, "#ifdef __cplusplus");
        let _ = writeln!(header, "}} /* extern \"C\" */");
        let _ = writeln!(header, "#endif /* __cplusplus */");
        let _ = writeln!(header);
        let _ = writeln!(header, "#endif /* {guard} */");
        let header_path = options.output_directory.join(Self::header_file_name(mpd));
        std::fs::write(&header_path, header).map_err(|e| DslError::output(header_path, e))?;

        let output = mpd.output_name();
        let mut src = String::new();
        let _ = writeln!(src, "/*!");
        let _ = writeln!(src, " * \\file {}", Self::source_file_name(mpd));
        let _ = writeln!(src, " * \\brief generated from {}", fd.file_name);
        let _ = writeln!(src, " */");
        let _ = writeln!(src, "#include <cmath>");
        let _ = writeln!(src, "#include <cstdio>");
        if !mpd.includes().is_empty() {
            let _ = writeln!(src, "{}", mpd.includes());
        }
        let _ = writeln!(src, "#include \"{}\"", Self::header_file_name(mpd));
        let _ = writeln!(src);
        let _ = writeln!(src, "double {function}(const double* const cyrano_params)");
        let _ = writeln!(src, "{{");
        let _ = writeln!(src, "using namespace std;");
        for (i, v) in mpd.inputs().iter().enumerate() {
            let _ = writeln!(src, "const double {} = cyrano_params[{i}];", v.name);
        }
        for v in mpd.static_variables() {
            match v.value {
                StaticVariableValue::Int(value) => {
                    let _ = writeln!(src, "static constexpr int {} = {value};", v.name);
                }
                StaticVariableValue::Real(value) => {
                    let _ = writeln!(src, "static constexpr double {} = {value:e};", v.name);
                }
            }
        }
        for p in mpd.parameters() {
            if let Some(value) = mpd.parameters_values().get(&p.name) {
                let _ = writeln!(src, "static constexpr double {} = {value:e};", p.name);
            }
        }
        match policy {
            OutOfBoundsPolicy::None => {}
            OutOfBoundsPolicy::Warning => {
                let _ = writeln!(
                    src,
                    "if({function}_checkBounds(cyrano_params) != 0){{"
                );
                let _ = writeln!(
                    src,
                    "fprintf(stderr, \"{function}: out of bounds\\n\");"
                );
                let _ = writeln!(src, "}}");
            }
            OutOfBoundsPolicy::Strict => {
                let _ = writeln!(
                    src,
                    "if({function}_checkBounds(cyrano_params) != 0){{"
                );
                let _ = writeln!(src, "return nan(\"{function}: out of bounds\");");
                let _ = writeln!(src, "}}");
            }
        }
        let _ = writeln!(src, "double {output};");
        let _ = writeln!(src, "{}", mpd.function().code);
        let _ = writeln!(src, "return {output};");
        let _ = writeln!(src, "}} /* end of {function} */");
        let _ = writeln!(src);
        let _ = writeln!(
            src,
            "int {function}_checkBounds(const double* const cyrano_params)"
        );
        let _ = writeln!(src, "{{");
        for (i, v) in mpd.inputs().iter().enumerate() {
            let _ = writeln!(src, "const double {} = cyrano_params[{i}];", v.name);
        }
        super::mfront::write_bounds_checks(&mut src, mpd);
        let _ = writeln!(src, "return 0;");
        let _ = writeln!(src, "}} /* end of {function}_checkBounds */");
        let source_path = options.output_directory.join(Self::source_file_name(mpd));
        std::fs::write(&source_path, src).map_err(|e| DslError::output(source_path, e))
    }
}
