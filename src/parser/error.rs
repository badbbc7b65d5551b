//! Parse-time error types.
//!
//! Every fault raised while interpreting a DSL file is a [`ParseError`]
//! carrying the originating operation, a human-readable message and, when a
//! token position is available, the source line. File-level faults (an
//! unreadable input) and parse faults are unified in [`DslError`] at the
//! crate boundary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A parse-time fault.
///
/// `operation` names the parsing primitive or keyword handler that detected
/// the fault, mirroring the diagnostics of the generated-code toolchain this
/// front end feeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    /// Name of the operation that raised the error
    pub operation: String,
    /// Human-readable message
    pub message: String,
    /// Source line, when a token position was available
    pub line: Option<u32>,
}

impl ParseError {
    pub fn new(
        operation: impl Into<String>,
        message: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
            line,
        }
    }

    /// An error with no known source position (description-model faults).
    pub fn semantic(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(operation, message, None)
    }

    /// Attach a source line if none is recorded yet.
    pub fn or_at_line(mut self, line: u32) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)?;
        if let Some(line) = self.line {
            write!(f, "\nError at line {line}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while compiling a DSL file.
#[derive(Debug, Error)]
pub enum DslError {
    /// The input file could not be opened or read.
    #[error("unable to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A generated output file could not be written.
    #[error("unable to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A fault raised while interpreting the token stream.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl DslError {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let e = ParseError::new("Engine::read_specified_token", "expected ';'", Some(12));
        let s = e.to_string();
        assert!(s.contains("Engine::read_specified_token"));
        assert!(s.contains("expected ';'"));
        assert!(s.contains("line 12"));
    }

    #[test]
    fn test_display_without_line() {
        let e = ParseError::semantic("BehaviourDescription::add_main_variable", "not general");
        assert!(!e.to_string().contains("line"));
    }

    #[test]
    fn test_or_at_line_keeps_existing() {
        let e = ParseError::new("op", "msg", Some(3)).or_at_line(9);
        assert_eq!(e.line, Some(3));
        let e = ParseError::semantic("op", "msg").or_at_line(9);
        assert_eq!(e.line, Some(9));
    }
}
