//! Material-knowledge attributes
//!
//! A typed key-value store shared by all description models. The store
//! enforces type stability: once a key holds a value of one type, it can
//! never be re-bound to a value of another type.

use indexmap::IndexMap;

use crate::parser::error::ParseError;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKnowledgeAttribute {
    Bool(bool),
    UShort(u16),
    String(String),
}

impl MaterialKnowledgeAttribute {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UShort(_) => "unsigned short",
            Self::String(_) => "string",
        }
    }

    fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for MaterialKnowledgeAttribute {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u16> for MaterialKnowledgeAttribute {
    fn from(v: u16) -> Self {
        Self::UShort(v)
    }
}

impl From<String> for MaterialKnowledgeAttribute {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for MaterialKnowledgeAttribute {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

/// Well-known attribute names.
pub mod attribute_names {
    pub const DEFAULT_OUT_OF_BOUNDS_POLICY: &str = "default_out_of_bounds_policy";
    pub const OUT_OF_BOUNDS_POLICY_RUNTIME_MODIFICATION: &str =
        "out_of_bounds_policy_runtime_modification";
    pub const PARAMETERS_AS_STATIC_VARIABLES: &str = "parameters_as_static_variables";
    pub const PARAMETERS_INITIALIZATION_FROM_FILE: &str = "parameters_initialization_from_file";
    pub const BUILD_IDENTIFIER: &str = "build_identifier";
}

/// The attribute store of a description model.
#[derive(Debug, Default, Clone)]
pub struct MaterialKnowledgeDescription {
    attributes: IndexMap<String, MaterialKnowledgeAttribute>,
}

impl MaterialKnowledgeDescription {
    /// Insert an attribute.
    ///
    /// A collision with an existing value of the same type is permitted only
    /// when `allow_existing` is set, in which case the existing value is kept
    /// untouched. A collision with a value of a different type is always an
    /// error.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<MaterialKnowledgeAttribute>,
        allow_existing: bool,
    ) -> Result<(), ParseError> {
        const M: &str = "MaterialKnowledgeDescription::set_attribute";
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.attributes.get(&name) {
            if !existing.same_type(&value) {
                return Err(ParseError::semantic(
                    M,
                    format!(
                        "attribute '{name}' already exists with type '{}'",
                        existing.type_name()
                    ),
                ));
            }
            if !allow_existing {
                return Err(ParseError::semantic(
                    M,
                    format!("attribute '{name}' already declared"),
                ));
            }
            return Ok(());
        }
        self.attributes.insert(name, value);
        Ok(())
    }

    /// Replace the value of an existing attribute of the same type.
    pub fn update_attribute(
        &mut self,
        name: &str,
        value: impl Into<MaterialKnowledgeAttribute>,
    ) -> Result<(), ParseError> {
        const M: &str = "MaterialKnowledgeDescription::update_attribute";
        let value = value.into();
        let Some(existing) = self.attributes.get_mut(name) else {
            return Err(ParseError::semantic(M, format!("unknown attribute '{name}'")));
        };
        if !existing.same_type(&value) {
            return Err(ParseError::semantic(
                M,
                format!(
                    "attribute '{name}' already exists with type '{}'",
                    existing.type_name()
                ),
            ));
        }
        *existing = value;
        Ok(())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&MaterialKnowledgeAttribute> {
        self.attributes.get(name)
    }

    /// Boolean attribute, with a typed default fallback.
    pub fn bool_attribute(&self, name: &str, default: bool) -> Result<bool, ParseError> {
        match self.attributes.get(name) {
            None => Ok(default),
            Some(MaterialKnowledgeAttribute::Bool(v)) => Ok(*v),
            Some(a) => Err(Self::type_mismatch(name, "bool", a)),
        }
    }

    /// String attribute, with a typed default fallback.
    pub fn string_attribute(&self, name: &str, default: &str) -> Result<String, ParseError> {
        match self.attributes.get(name) {
            None => Ok(default.to_owned()),
            Some(MaterialKnowledgeAttribute::String(v)) => Ok(v.clone()),
            Some(a) => Err(Self::type_mismatch(name, "string", a)),
        }
    }

    pub fn attributes(&self) -> &IndexMap<String, MaterialKnowledgeAttribute> {
        &self.attributes
    }

    fn type_mismatch(name: &str, expected: &str, got: &MaterialKnowledgeAttribute) -> ParseError {
        ParseError::semantic(
            "MaterialKnowledgeDescription::attribute",
            format!(
                "attribute '{name}' holds a '{}' value, expected '{expected}'",
                got.type_name()
            ),
        )
    }
}

/// The tri-state out-of-bounds policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfBoundsPolicy {
    #[default]
    None,
    Warning,
    Strict,
}

impl OutOfBoundsPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Warning => "Warning",
            Self::Strict => "Strict",
        }
    }

    fn parse(s: &str, operation: &str) -> Result<Self, ParseError> {
        match s {
            "None" => Ok(Self::None),
            "Warning" => Ok(Self::Warning),
            "Strict" => Ok(Self::Strict),
            _ => Err(ParseError::semantic(
                operation,
                format!("invalid out-of-bounds policy '{s}'"),
            )),
        }
    }
}

/// Set the default out-of-bounds policy attribute, validating the value.
pub fn set_default_out_of_bounds_policy(
    d: &mut MaterialKnowledgeDescription,
    policy: &str,
) -> Result<(), ParseError> {
    OutOfBoundsPolicy::parse(policy, "set_default_out_of_bounds_policy")?;
    d.set_attribute(attribute_names::DEFAULT_OUT_OF_BOUNDS_POLICY, policy, false)
}

/// The default out-of-bounds policy, validating the stored value.
pub fn default_out_of_bounds_policy(
    d: &MaterialKnowledgeDescription,
) -> Result<OutOfBoundsPolicy, ParseError> {
    let policy = d.string_attribute(attribute_names::DEFAULT_OUT_OF_BOUNDS_POLICY, "None")?;
    OutOfBoundsPolicy::parse(&policy, "default_out_of_bounds_policy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_update_same_type() {
        let mut d = MaterialKnowledgeDescription::default();
        d.set_attribute("flag", true, false).unwrap();
        d.update_attribute("flag", false).unwrap();
        assert_eq!(d.bool_attribute("flag", true).unwrap(), false);
    }

    #[test]
    fn test_update_with_other_type_fails() {
        let mut d = MaterialKnowledgeDescription::default();
        d.set_attribute("flag", true, false).unwrap();
        let err = d.update_attribute("flag", "nope").unwrap_err();
        assert!(err.message.contains("different") || err.message.contains("type"));
    }

    #[test]
    fn test_set_existing_requires_opt_in() {
        let mut d = MaterialKnowledgeDescription::default();
        d.set_attribute("flag", true, false).unwrap();
        assert!(d.set_attribute("flag", false, false).is_err());
        // opting in keeps the existing value
        d.set_attribute("flag", false, true).unwrap();
        assert_eq!(d.bool_attribute("flag", false).unwrap(), true);
        // but a different type is always an error
        assert!(d.set_attribute("flag", "s", true).is_err());
    }

    #[test]
    fn test_update_unknown_fails() {
        let mut d = MaterialKnowledgeDescription::default();
        assert!(d.update_attribute("missing", true).is_err());
    }

    #[test]
    fn test_typed_read_with_default() {
        let d = MaterialKnowledgeDescription::default();
        assert_eq!(d.bool_attribute("absent", true).unwrap(), true);
        let mut d = d;
        d.set_attribute("s", "x", false).unwrap();
        assert!(d.bool_attribute("s", false).is_err());
    }

    #[test]
    fn test_out_of_bounds_policy_validation() {
        let mut d = MaterialKnowledgeDescription::default();
        assert!(set_default_out_of_bounds_policy(&mut d, "Sometimes").is_err());
        set_default_out_of_bounds_policy(&mut d, "Strict").unwrap();
        assert_eq!(
            default_out_of_bounds_policy(&d).unwrap(),
            OutOfBoundsPolicy::Strict
        );
    }

    #[test]
    fn test_out_of_bounds_policy_corrupted_read_fails() {
        let mut d = MaterialKnowledgeDescription::default();
        d.set_attribute(attribute_names::DEFAULT_OUT_OF_BOUNDS_POLICY, "Sideways", false)
            .unwrap();
        assert!(default_out_of_bounds_policy(&d).is_err());
    }
}
