//! Targets descriptions
//!
//! A targets description records the build artifacts a compilation
//! produces: library targets with their sources and dependencies, headers,
//! and named specific targets. Descriptions are merged when one DSL file
//! recursively imports another; list attributes are unioned, conflicting
//! scalar attributes are an error.

use indexmap::IndexMap;

use crate::parser::error::ParseError;

/// One generated library target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryTarget {
    pub name: String,
    /// Library file prefix, e.g. `lib`
    pub prefix: String,
    /// Library file suffix, e.g. `so`
    pub suffix: String,
    pub sources: Vec<String>,
    pub cppflags: Vec<String>,
    pub ldflags: Vec<String>,
    /// Entry points exported by the library
    pub entry_points: Vec<String>,
    /// Names of targets this library depends on
    pub dependencies: Vec<String>,
}

impl LibraryTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: "lib".to_owned(),
            suffix: default_library_suffix().to_owned(),
            sources: Vec::new(),
            cppflags: Vec::new(),
            ldflags: Vec::new(),
            entry_points: Vec::new(),
            dependencies: Vec::new(),
        }
    }
}

fn default_library_suffix() -> &'static str {
    if cfg!(target_os = "macos") {
        "dylib"
    } else if cfg!(windows) {
        "dll"
    } else {
        "so"
    }
}

/// A named specific target with its dependencies and commands.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpecificTarget {
    pub dependencies: Vec<String>,
    pub commands: Vec<String>,
}

/// The build artifacts of one compilation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetsDescription {
    libraries: Vec<LibraryTarget>,
    pub headers: Vec<String>,
    pub specific_targets: IndexMap<String, SpecificTarget>,
}

impl TargetsDescription {
    /// The library target of the given name, created on first use.
    pub fn library_mut(&mut self, name: &str) -> &mut LibraryTarget {
        if let Some(i) = self.libraries.iter().position(|l| l.name == name) {
            return &mut self.libraries[i];
        }
        self.libraries.push(LibraryTarget::new(name));
        self.libraries.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn library(&self, name: &str) -> Option<&LibraryTarget> {
        self.libraries.iter().find(|l| l.name == name)
    }

    pub fn libraries(&self) -> &[LibraryTarget] {
        &self.libraries
    }

    pub fn libraries_mut(&mut self) -> &mut [LibraryTarget] {
        &mut self.libraries
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty() && self.headers.is_empty() && self.specific_targets.is_empty()
    }
}

pub(crate) fn insert_if(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_owned());
    }
}

/// Merge `src` into `dst`.
///
/// Library targets of the same name are combined by unioning their list
/// attributes; a conflict on a scalar attribute (prefix, suffix) is an
/// error. Specific targets of the same name union their dependency and
/// command lists.
pub fn merge_targets_description(
    dst: &mut TargetsDescription,
    src: &TargetsDescription,
) -> Result<(), ParseError> {
    const M: &str = "merge_targets_description";
    for lib in &src.libraries {
        let target = dst.library_mut(&lib.name);
        if target.prefix != lib.prefix {
            return Err(ParseError::semantic(
                M,
                format!(
                    "unmatched library prefix for target '{}' ('{}' vs '{}')",
                    lib.name, target.prefix, lib.prefix
                ),
            ));
        }
        if target.suffix != lib.suffix {
            return Err(ParseError::semantic(
                M,
                format!(
                    "unmatched library suffix for target '{}' ('{}' vs '{}')",
                    lib.name, target.suffix, lib.suffix
                ),
            ));
        }
        for s in &lib.sources {
            insert_if(&mut target.sources, s);
        }
        for f in &lib.cppflags {
            insert_if(&mut target.cppflags, f);
        }
        for f in &lib.ldflags {
            insert_if(&mut target.ldflags, f);
        }
        for e in &lib.entry_points {
            insert_if(&mut target.entry_points, e);
        }
        for d in &lib.dependencies {
            insert_if(&mut target.dependencies, d);
        }
    }
    for h in &src.headers {
        insert_if(&mut dst.headers, h);
    }
    for (name, st) in &src.specific_targets {
        let target = dst.specific_targets.entry(name.clone()).or_default();
        for d in &st.dependencies {
            insert_if(&mut target.dependencies, d);
        }
        for c in &st.commands {
            insert_if(&mut target.commands, c);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_sources(name: &str, sources: &[&str]) -> TargetsDescription {
        let mut td = TargetsDescription::default();
        let lib = td.library_mut(name);
        for s in sources {
            lib.sources.push((*s).to_owned());
        }
        td
    }

    #[test]
    fn test_merge_unions_sources() {
        let mut a = with_sources("MaterialLaws", &["a.cxx", "b.cxx"]);
        let b = with_sources("MaterialLaws", &["b.cxx", "c.cxx"]);
        merge_targets_description(&mut a, &b).unwrap();
        assert_eq!(
            a.library("MaterialLaws").unwrap().sources,
            ["a.cxx", "b.cxx", "c.cxx"]
        );
    }

    #[test]
    fn test_merge_distinct_libraries() {
        let mut a = with_sources("A", &["a.cxx"]);
        let b = with_sources("B", &["b.cxx"]);
        merge_targets_description(&mut a, &b).unwrap();
        assert_eq!(a.libraries().len(), 2);
    }

    #[test]
    fn test_merge_conflicting_suffix_fails() {
        let mut a = with_sources("A", &[]);
        let mut b = with_sources("A", &[]);
        b.library_mut("A").suffix = "weird".to_owned();
        assert!(merge_targets_description(&mut a, &b).is_err());
    }

    #[test]
    fn test_merge_specific_targets() {
        let mut a = TargetsDescription::default();
        a.specific_targets.insert(
            "doc".to_owned(),
            SpecificTarget {
                dependencies: vec!["x".to_owned()],
                commands: vec!["make doc".to_owned()],
            },
        );
        let b = a.clone();
        merge_targets_description(&mut a, &b).unwrap();
        assert_eq!(a.specific_targets["doc"].dependencies, ["x"]);
        assert_eq!(a.specific_targets["doc"].commands, ["make doc"]);
    }
}
