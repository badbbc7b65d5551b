//! Output-target interfaces
//!
//! An interface is a code generator for one host simulation code. All
//! interfaces expose the same capability set - describing the targets they
//! generate, handling interface-specific keywords, and writing the output
//! files - behind one trait; the DSL engine delegates through a name-keyed
//! registry and never knows a concrete generator.

pub mod castem;
pub mod cyrano;
pub mod mfront;
pub mod targets;

use indexmap::IndexMap;

use crate::model::{FileDescription, MaterialPropertyDescription};
use crate::parser::error::{DslError, ParseError};
use crate::parser::stream::TokenStream;
use crate::project::CompilerOptions;

pub use targets::{LibraryTarget, SpecificTarget, TargetsDescription, merge_targets_description};

/// The capability set of an output-target generator.
///
/// `get_targets_description` must be called before `write_output_files` and
/// is idempotent: it only populates the targets graph passed by reference.
pub trait MaterialPropertyInterface {
    /// Registry key of this interface.
    fn name(&self) -> &'static str;

    /// Describe the files this interface generates for a description.
    fn get_targets_description(
        &self,
        td: &mut TargetsDescription,
        mpd: &MaterialPropertyDescription,
    );

    /// Offer an unrecognized keyword to this interface.
    ///
    /// Returns whether the keyword was handled; an unhandled keyword must
    /// leave the cursor untouched.
    fn treat_keyword(&mut self, key: &str, stream: &mut TokenStream)
    -> Result<bool, ParseError>;

    /// Write the generated files into the configured output directory.
    fn write_output_files(
        &self,
        mpd: &MaterialPropertyDescription,
        fd: &FileDescription,
        options: &CompilerOptions,
    ) -> Result<(), DslError>;
}

impl std::fmt::Debug for Box<dyn MaterialPropertyInterface> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialPropertyInterface")
            .field("name", &self.name())
            .finish()
    }
}

type InterfaceFactory = fn() -> Box<dyn MaterialPropertyInterface>;

/// Name-keyed registry of interface factories, populated at driver startup.
pub struct InterfaceRegistry {
    factories: IndexMap<&'static str, InterfaceFactory>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// A registry holding the built-in interfaces.
    pub fn with_builtin_interfaces() -> Self {
        let mut r = Self::new();
        r.register("mfront", || {
            Box::new(mfront::MfrontMaterialPropertyInterface::new())
        });
        r.register("cyrano", || {
            Box::new(cyrano::CyranoMaterialPropertyInterface::new())
        });
        r.register("castem", || {
            Box::new(castem::CastemMaterialPropertyInterface::new())
        });
        r
    }

    pub fn register(&mut self, name: &'static str, factory: InterfaceFactory) {
        self.factories.insert(name, factory);
    }

    /// Instantiate an interface by name.
    pub fn create(&self, name: &str) -> Result<Box<dyn MaterialPropertyInterface>, ParseError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            ParseError::semantic(
                "InterfaceRegistry::create",
                format!("unknown interface '{name}'"),
            )
        })?;
        Ok(factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::with_builtin_interfaces()
    }
}

/// Include-guard macro name for a generated header.
pub(crate) fn include_guard(file_stem: &str) -> String {
    let mut guard = String::from("LIB_");
    for c in file_stem.chars() {
        guard.push(if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        });
    }
    guard.push_str("_HXX");
    guard
}

/// `const double a, const double b` argument list over the inputs.
pub(crate) fn argument_list(mpd: &MaterialPropertyDescription) -> String {
    mpd.inputs()
        .iter()
        .map(|v| format!("const double {}", v.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_unknown_interface() {
        let r = InterfaceRegistry::with_builtin_interfaces();
        let err = r.create("abaqus").unwrap_err();
        assert!(err.message.contains("unknown interface 'abaqus'"));
    }

    #[test]
    fn test_registry_builtin_names() {
        let r = InterfaceRegistry::with_builtin_interfaces();
        let names: Vec<_> = r.names().collect();
        assert_eq!(names, ["mfront", "cyrano", "castem"]);
        assert_eq!(r.create("cyrano").unwrap().name(), "cyrano");
    }

    #[test]
    fn test_include_guard() {
        assert_eq!(include_guard("UO2_Young-mfront"), "LIB_UO2_YOUNG_MFRONT_HXX");
    }
}
