//! Per-compilation options
//!
//! No process-wide mutable state: every compilation carries its own options
//! value, threaded through the engine and the keyword handlers.

use std::path::PathBuf;

use super::search::SearchPaths;

/// Options of one compilation.
#[derive(Debug, Default, Clone)]
pub struct CompilerOptions {
    /// Suppress `#line` markers in generated code
    pub debug: bool,
    /// Emit warnings for tolerated sloppiness (extra `;`, ...)
    pub pedantic: bool,
    /// Search paths for imported files
    pub search: SearchPaths,
    /// Directory generated files are written into
    pub output_directory: PathBuf,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            ..Self::default()
        }
    }
}
