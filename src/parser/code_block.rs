//! Code-block parsing configuration and result types
//!
//! A brace-delimited block of user code is re-serialized token by token,
//! qualifying registered member and static-member names on the way. The
//! options record controls delimiters, qualification, semicolon policing and
//! line-marker emission; two pluggable capabilities allow a DSL variant to
//! rewrite member references or observe every word of the block.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Rewrites a member-variable reference, e.g. prefixing it with an owner
/// qualifier.
pub trait VariableModifier {
    fn rewrite(&self, name: &str, add_this_ptr: bool) -> String;
}

/// Observes every non-comment word of a block as it is parsed.
pub trait WordAnalyser {
    fn visit(&mut self, word: &str);
}

/// Configuration for one code-block parse.
pub struct CodeBlockOptions {
    /// Opening delimiter, `{` unless overridden
    pub delim_open: SmolStr,
    /// Closing delimiter, `}` unless overridden
    pub delim_close: SmolStr,
    /// Prefix registered static-member names with the owner qualifier
    pub qualify_static_variables: bool,
    /// Prefix registered member names with a self reference
    pub qualify_member_variables: bool,
    /// Permit `;` tokens inside the block
    pub allow_semicolon: bool,
    /// Emit `#line` markers when the source line advances
    pub register_line: bool,
    /// Registered static-member names
    pub static_member_names: FxHashSet<SmolStr>,
    /// Registered member names
    pub member_names: FxHashSet<SmolStr>,
    /// Optional member-reference rewriter
    pub modifier: Option<Box<dyn VariableModifier>>,
    /// Optional per-word observer
    pub analyser: Option<Box<dyn WordAnalyser>>,
}

impl Default for CodeBlockOptions {
    fn default() -> Self {
        Self {
            delim_open: SmolStr::new_static("{"),
            delim_close: SmolStr::new_static("}"),
            qualify_static_variables: false,
            qualify_member_variables: false,
            allow_semicolon: true,
            register_line: true,
            static_member_names: FxHashSet::default(),
            member_names: FxHashSet::default(),
            modifier: None,
            analyser: None,
        }
    }
}

impl std::fmt::Debug for CodeBlockOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeBlockOptions")
            .field("delim_open", &self.delim_open)
            .field("delim_close", &self.delim_close)
            .field("qualify_static_variables", &self.qualify_static_variables)
            .field("qualify_member_variables", &self.qualify_member_variables)
            .field("allow_semicolon", &self.allow_semicolon)
            .field("register_line", &self.register_line)
            .field("static_member_names", &self.static_member_names)
            .field("member_names", &self.member_names)
            .field("modifier", &self.modifier.is_some())
            .field("analyser", &self.analyser.is_some())
            .finish()
    }
}

/// Result of one code-block parse. Immutable once returned.
#[derive(Debug, Default, Clone)]
pub struct CodeBlock {
    /// Re-serialized code, single-space separated, with optional line markers
    pub code: String,
    /// Comments accumulated from the block, newline separated
    pub description: String,
    /// Member names encountered in the block
    pub members: FxHashSet<SmolStr>,
    /// Static-member names encountered in the block
    pub static_members: FxHashSet<SmolStr>,
}
