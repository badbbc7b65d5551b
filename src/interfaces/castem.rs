//! Material-property interface for the Cast3M code
//!
//! Cast3M loads material properties as external functions taking their
//! inputs as a single array. The interface accepts one specific keyword,
//! `@CastemCompatibility`, selecting the legacy calling convention.

use std::fmt::Write as _;

use tracing::debug;

use crate::model::{FileDescription, MaterialPropertyDescription, StaticVariableValue};
use crate::parser::error::{DslError, ParseError};
use crate::parser::stream::TokenStream;
use crate::project::CompilerOptions;

use super::targets::TargetsDescription;
use super::{MaterialPropertyInterface, include_guard};

pub struct CastemMaterialPropertyInterface {
    /// Emit the legacy calling convention, `@CastemCompatibility true;`
    compatibility_mode: bool,
}

impl CastemMaterialPropertyInterface {
    pub fn new() -> Self {
        Self {
            compatibility_mode: false,
        }
    }

    pub fn castem_function_name(mpd: &MaterialPropertyDescription) -> String {
        format!("{}_castem", mpd.material_law_name())
    }

    fn header_file_name(mpd: &MaterialPropertyDescription) -> String {
        format!("{}-castem.hxx", mpd.material_law_name())
    }

    fn source_file_name(mpd: &MaterialPropertyDescription) -> String {
        format!("{}-castem.cxx", mpd.material_law_name())
    }
}

impl Default for CastemMaterialPropertyInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialPropertyInterface for CastemMaterialPropertyInterface {
    fn name(&self) -> &'static str {
        "castem"
    }

    fn get_targets_description(
        &self,
        td: &mut TargetsDescription,
        mpd: &MaterialPropertyDescription,
    ) {
        let lib = td.library_mut("CastemMaterialLaws");
        lib.sources.push(Self::source_file_name(mpd));
        lib.entry_points.push(Self::castem_function_name(mpd));
        td.headers.push(Self::header_file_name(mpd));
    }

    fn treat_keyword(&mut self, key: &str, stream: &mut TokenStream) -> Result<bool, ParseError> {
        const M: &str = "CastemMaterialPropertyInterface::treat_keyword";
        if key != "@CastemCompatibility" {
            return Ok(false);
        }
        self.compatibility_mode = stream.read_boolean_value(M)?;
        stream.read_specified_token(M, ";")?;
        Ok(true)
    }

    fn write_output_files(
        &self,
        mpd: &MaterialPropertyDescription,
        fd: &FileDescription,
        options: &CompilerOptions,
    ) -> Result<(), DslError> {
        let function = Self::castem_function_name(mpd);
        debug!(law = %mpd.material_law_name(), "writing castem interface files");
        let signature = if self.compatibility_mode {
            format!("double {function}(const double* const values, const int nvalues)")
        } else {
            format!("double {function}(const double* const values)")
        };

        let guard = include_guard(&format!("{}-castem", mpd.material_law_name()));
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
        let _ = writeln!(header, "{signature};");
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
        if !mpd.includes().is_empty() {
            let _ = writeln!(src, "{}", mpd.includes());
        }
        let _ = writeln!(src, "#include \"{}\"", Self::header_file_name(mpd));
        let _ = writeln!(src);
        let _ = writeln!(src, "{signature}");
        let _ = writeln!(src, "{{");
        let _ = writeln!(src, "using namespace std;");
        for (i, v) in mpd.inputs().iter().enumerate() {
            let _ = writeln!(src, "const double {} = values[{i}];", v.name);
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
        let _ = writeln!(src, "double {output};");
        let _ = writeln!(src, "{}", mpd.function().code);
        let _ = writeln!(src, "return {output};");
        let _ = writeln!(src, "}} /* end of {function} */");
        let source_path = options.output_directory.join(Self::source_file_name(mpd));
        std::fs::write(&source_path, src).map_err(|e| DslError::output(source_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    #[test]
    fn test_treat_keyword_compatibility() {
        let mut i = CastemMaterialPropertyInterface::new();
        let mut s = TokenStream::new(tokenize("true;").unwrap());
        assert!(i.treat_keyword("@CastemCompatibility", &mut s).unwrap());
        assert!(i.compatibility_mode);
        assert!(s.at_end());
    }

    #[test]
    fn test_treat_keyword_unhandled_leaves_cursor() {
        let mut i = CastemMaterialPropertyInterface::new();
        let mut s = TokenStream::new(tokenize("true;").unwrap());
        assert!(!i.treat_keyword("@Other", &mut s).unwrap());
        assert_eq!(s.cursor(), 0);
    }
}
