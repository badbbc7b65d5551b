//! Reserved-name tracking
//!
//! Each compilation owns one pool of names that user code may not declare:
//! functions and namespaces of the generated-code support libraries, the
//! supported type names, and a few names the engine itself emits. The pool
//! grows monotonically as variables are registered, temporaries are handed
//! out and material-law functions are imported.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::parser::error::ParseError;
use crate::parser::lexer::is_valid_identifier;

use super::types::type_flags;

/// Names of the numeric and library functions available to generated code.
const LIBRARY_FUNCTION_NAMES: &[&str] = &[
    "std", "cout", "cerr", "endl", "cos", "sin", "tan", "acos", "asin", "atan", "atan2", "cosh",
    "sinh", "tanh", "acosh", "asinh", "atanh", "exp", "frexp", "ldexp", "log", "log10", "modf",
    "exp2", "expm1", "ilogb", "log1p", "log2", "logb", "scalbn", "scalbln", "pow", "sqrt", "cbrt",
    "hypot", "erf", "erfc", "tgamma", "lgamma", "abs",
];

/// Namespaces of the generated-code support libraries.
const LIBRARY_NAMESPACES: &[&str] = &[
    "matforge",
    "math",
    "material",
    "utilities",
    "exception",
    "glossary",
];

/// Names the engine itself emits into generated code.
const ENGINE_RESERVED: &[&str] = &["policy", "errno", "matforge_errno", "matforge_errno_old"];

/// The per-compilation reserved-name set.
#[derive(Debug, Clone)]
pub struct NamePool {
    reserved: FxHashSet<SmolStr>,
}

impl NamePool {
    /// A pool seeded with the default reserved names.
    pub fn new() -> Self {
        let mut reserved = FxHashSet::default();
        for n in LIBRARY_FUNCTION_NAMES
            .iter()
            .chain(LIBRARY_NAMESPACES)
            .chain(ENGINE_RESERVED)
        {
            reserved.insert(SmolStr::new_static(n));
        }
        for (n, _) in type_flags() {
            reserved.insert(SmolStr::new_static(n));
        }
        Self { reserved }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Reserve a name, failing if it is already reserved.
    pub fn reserve(&mut self, name: impl Into<SmolStr>) -> Result<(), ParseError> {
        let name = name.into();
        if !self.reserved.insert(name.clone()) {
            return Err(ParseError::semantic(
                "NamePool::reserve",
                format!("name '{name}' is already reserved"),
            ));
        }
        Ok(())
    }

    /// Reserve and return the first free `prefixN` name.
    pub fn temporary_name(&mut self, prefix: &str) -> Result<SmolStr, ParseError> {
        if !is_valid_identifier(prefix) {
            return Err(ParseError::semantic(
                "NamePool::temporary_name",
                format!("invalid variable prefix '{prefix}'"),
            ));
        }
        for i in 0..u32::MAX {
            let candidate = SmolStr::new(format!("{prefix}{i}"));
            if !self.is_reserved(&candidate) {
                self.reserved.insert(candidate.clone());
                return Ok(candidate);
            }
        }
        Err(ParseError::semantic(
            "NamePool::temporary_name",
            "unable to find a temporary variable",
        ))
    }
}

impl Default for NamePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seeding() {
        let pool = NamePool::new();
        assert!(pool.is_reserved("sqrt"));
        assert!(pool.is_reserved("matforge"));
        assert!(pool.is_reserved("real"));
        assert!(pool.is_reserved("policy"));
        assert!(!pool.is_reserved("young"));
    }

    #[test]
    fn test_reserve_twice_fails() {
        let mut pool = NamePool::new();
        pool.reserve("young").unwrap();
        assert!(pool.reserve("young").is_err());
    }

    #[test]
    fn test_temporary_name_skips_reserved() {
        let mut pool = NamePool::new();
        pool.reserve("tmp0").unwrap();
        assert_eq!(pool.temporary_name("tmp").unwrap(), "tmp1");
        // the handed-out name is itself reserved now
        assert_eq!(pool.temporary_name("tmp").unwrap(), "tmp2");
    }

    #[test]
    fn test_temporary_name_invalid_prefix() {
        let mut pool = NamePool::new();
        assert!(pool.temporary_name("2bad").is_err());
    }
}
