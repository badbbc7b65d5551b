//! Input file lookup
//!
//! Imported files are named relative to the importing file or to a set of
//! registered search paths. Lookup tries the name as given first, then each
//! search path in registration order.

use std::path::{Path, PathBuf};

use crate::parser::error::DslError;

/// Ordered search paths for imported DSL files.
#[derive(Debug, Default, Clone)]
pub struct SearchPaths {
    paths: Vec<PathBuf>,
}

impl SearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Resolve a file name to an existing path.
    pub fn search(&self, name: &str) -> Result<PathBuf, DslError> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Ok(direct.to_owned());
        }
        for p in &self.paths {
            let candidate = p.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(DslError::file(
            name,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file in search paths"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_direct_and_registered() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("law.mfront");
        std::fs::write(&f, "@Law L;").unwrap();

        let mut sp = SearchPaths::new();
        assert!(sp.search("law.mfront").is_err());
        sp.add(dir.path());
        assert_eq!(sp.search("law.mfront").unwrap(), f);
        assert_eq!(sp.search(f.to_str().unwrap()).unwrap(), f);
    }
}
