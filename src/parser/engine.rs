//! DSL base engine
//!
//! Owns the token stream and the state every keyword handler composes:
//! the reserved-name pool, declared integer constants, imported material
//! laws, the file metadata and the accumulated targets descriptions.
//! Provides the composite parsing operations (variable lists, code blocks,
//! initialisation values, whole-statement skipping) that DSL variants build
//! their keyword tables from.

use std::path::Path;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::interfaces::targets::{TargetsDescription, insert_if, merge_targets_description};
use crate::model::{
    FileDescription, NamePool, StaticVariableDescription, StaticVariableValue,
    VariableDescription, VariableDescriptionContainer,
};
use crate::project::CompilerOptions;

use super::code_block::{CodeBlock, CodeBlockOptions};
use super::error::{DslError, ParseError};
use super::eval::evaluate_integer_expression;
use super::lexer::{TokenFlag, is_valid_identifier, tokenize};
use super::stream::TokenStream;

/// Tokens that make the following identifier a member access, suppressing
/// qualification.
const MEMBER_ACCESS_TOKENS: [&str; 3] = ["->", ".", "::"];

/// Saved source position of an enclosing parse, restored when a nested
/// parse completes.
#[derive(Debug)]
pub struct SourceState {
    stream: TokenStream,
    file_name: String,
}

/// The DSL base engine.
///
/// One engine instance lives for one compilation unit; nested compilations
/// (imports, material laws) either run on a fresh engine or swap the source
/// state in and out through [`DslEngine::save_source`].
#[derive(Debug)]
pub struct DslEngine {
    pub(crate) stream: TokenStream,
    /// Comment attached to the keyword currently being treated
    pub(crate) current_comment: String,
    pub(crate) options: CompilerOptions,
    /// Reserved-name set of this compilation
    pub(crate) names: NamePool,
    /// Integer constants usable in array-size expressions
    pub(crate) integer_constants: FxHashMap<SmolStr, i64>,
    /// Function names of imported material laws
    pub(crate) material_laws: Vec<SmolStr>,
    pub(crate) file: FileDescription,
    /// Targets of this compilation
    pub(crate) targets: TargetsDescription,
    /// Targets of recursively imported material laws, folded in by
    /// [`DslEngine::complete_targets_description`]
    pub(crate) imported_targets: Vec<TargetsDescription>,
    /// Owner qualifier for static members in code blocks
    class_name: SmolStr,
}

impl DslEngine {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            stream: TokenStream::default(),
            current_comment: String::new(),
            options,
            names: NamePool::new(),
            integer_constants: FxHashMap::default(),
            material_laws: Vec::new(),
            file: FileDescription::default(),
            targets: TargetsDescription::default(),
            imported_targets: Vec::new(),
            class_name: SmolStr::default(),
        }
    }

    /// Open and tokenize a file.
    ///
    /// The read handle is scoped to this call. `substitutions` rewrites
    /// matching token values before parsing; each `external_commands` entry
    /// is tokenized and spliced in front of the stream.
    pub fn open_file(
        &mut self,
        path: &Path,
        external_commands: &[String],
        substitutions: &FxHashMap<String, String>,
    ) -> Result<(), DslError> {
        let source = std::fs::read_to_string(path).map_err(|e| DslError::file(path, e))?;
        debug!(file = %path.display(), "opening DSL source");
        self.load_source(
            &source,
            &path.display().to_string(),
            external_commands,
            substitutions,
        )?;
        Ok(())
    }

    /// Tokenize an in-memory source under a virtual file name.
    pub fn open_string(&mut self, source: &str, name: &str) -> Result<(), ParseError> {
        self.load_source(source, name, &[], &FxHashMap::default())
    }

    fn load_source(
        &mut self,
        source: &str,
        name: &str,
        external_commands: &[String],
        substitutions: &FxHashMap<String, String>,
    ) -> Result<(), ParseError> {
        let mut tokens = tokenize(source)?;
        if !substitutions.is_empty() {
            for t in &mut tokens {
                if let Some(replacement) = substitutions.get(t.value.as_str()) {
                    t.value = SmolStr::new(replacement);
                }
            }
        }
        self.stream = TokenStream::new(tokens);
        for c in external_commands {
            let spliced = tokenize(c).map_err(|e| {
                ParseError::new(
                    "DslEngine::open_file",
                    format!("error while parsing external command '{c}'\n{e}"),
                    None,
                )
            })?;
            self.stream.insert_before_cursor(spliced);
        }
        self.file.file_name = name.to_owned();
        Ok(())
    }

    /// Swap the current source out for a nested parse. The caller must
    /// restore it with [`DslEngine::restore_source`] on every exit path.
    pub fn save_source(&mut self) -> SourceState {
        SourceState {
            stream: std::mem::take(&mut self.stream),
            file_name: std::mem::take(&mut self.file.file_name),
        }
    }

    pub fn restore_source(&mut self, state: SourceState) {
        self.stream = state.stream;
        self.file.file_name = state.file_name;
    }

    pub fn file(&self) -> &FileDescription {
        &self.file
    }

    pub fn file_name(&self) -> &str {
        &self.file.file_name
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn targets(&self) -> &TargetsDescription {
        &self.targets
    }

    pub fn set_class_name(&mut self, name: impl Into<SmolStr>) {
        self.class_name = name.into();
    }

    pub fn material_laws(&self) -> &[SmolStr] {
        &self.material_laws
    }

    pub fn is_name_reserved(&self, name: &str) -> bool {
        self.names.is_reserved(name)
    }

    /// Reserve and return the first free `prefixN` name.
    pub fn temporary_variable_name(&mut self, prefix: &str) -> Result<SmolStr, ParseError> {
        self.names.temporary_name(prefix)
    }

    // =========================================================================
    // Code blocks
    // =========================================================================

    /// Read one delimited block starting at the current cursor, which must
    /// point at `options.delim_open`.
    ///
    /// Registered static-member names are prefixed with the owner qualifier
    /// and member names with a self reference, unless the previous token is
    /// a member access or the supplied modifier rewrites the reference.
    /// Tokens are joined by single spaces; a line marker is inserted
    /// whenever the source line advances, unless debug mode suppresses
    /// markers. Comments accumulate into the block description.
    pub fn read_next_block(
        &mut self,
        options: &mut CodeBlockOptions,
    ) -> Result<CodeBlock, ParseError> {
        const M: &str = "DslEngine::read_next_block";
        let emit_markers = options.register_line && !self.options.debug;
        let delim_open = options.delim_open.clone();
        let delim_close = options.delim_close.clone();

        let mut block = CodeBlock::default();
        if !self.current_comment.is_empty() {
            block.description.push_str(&self.current_comment);
        }
        self.stream.read_specified_token(M, &delim_open)?;
        self.stream
            .check_not_at_end(M, &format!("expected a '{delim_close}'."))?;
        // empty block
        if self.stream.current().is_some_and(|t| t.value == delim_close) {
            self.stream.advance();
            return Ok(block);
        }

        let mut depth = 0u32;
        let mut current_line = self.stream.current().map_or(0, |t| t.line);
        if emit_markers {
            block.code = format!("#line {current_line} \"{}\"\n", self.file.file_name);
        }
        loop {
            let Some(t) = self.stream.current() else {
                return Err(ParseError::new(
                    M,
                    format!(
                        "expected the end of a block.\nNumber of blocks opened: {depth}"
                    ),
                    self.stream.current_line(),
                ));
            };
            if t.value == delim_close && depth == 0 {
                self.stream.advance();
                return Ok(block);
            }
            if t.line != current_line {
                current_line = t.line;
                if emit_markers {
                    block.code.push_str(&format!(
                        "\n#line {current_line} \"{}\"\n",
                        self.file.file_name
                    ));
                } else {
                    block.code.push('\n');
                }
            }
            if t.value == ";" && !options.allow_semicolon {
                return Err(ParseError::new(
                    M,
                    format!(
                        "read ';' before the end of block.\nNumber of blocks opened: {depth}"
                    ),
                    Some(t.line),
                ));
            }
            if !t.comment.is_empty() {
                if !block.description.is_empty() {
                    block.description.push('\n');
                }
                block.description.push_str(&t.comment);
            }
            let value = t.value.clone();
            if let Some(analyser) = options.analyser.as_mut() {
                analyser.visit(&value);
            }
            let previous = self.stream.previous().map(|p| p.value.clone());
            let after_member_access = previous
                .as_ref()
                .is_some_and(|p| MEMBER_ACCESS_TOKENS.contains(&p.as_str()));
            if options.static_member_names.contains(&value) {
                block.static_members.insert(value.clone());
                if !after_member_access
                    && options.qualify_static_variables
                    && !self.class_name.is_empty()
                {
                    block.code.push_str(&self.class_name);
                    block.code.push_str("::");
                }
                block.code.push_str(&value);
            } else if options.member_names.contains(&value) {
                block.members.insert(value.clone());
                let rewritten = if after_member_access {
                    value.to_string()
                } else if let Some(modifier) = options.modifier.as_deref() {
                    modifier.rewrite(&value, options.qualify_member_variables)
                } else if options.qualify_member_variables {
                    if previous.as_deref() == Some("*") {
                        format!("(this->{value})")
                    } else {
                        format!("this->{value}")
                    }
                } else {
                    value.to_string()
                };
                block.code.push_str(&rewritten);
            } else {
                block.code.push_str(&value);
            }
            block.code.push(' ');
            if value == delim_open {
                depth += 1;
            } else if value == delim_close {
                depth -= 1;
            }
            self.stream.advance();
        }
    }

    /// Parse the same token span twice under two option sets, resetting the
    /// cursor between the passes.
    pub fn read_next_block_pair(
        &mut self,
        first: &mut CodeBlockOptions,
        second: &mut CodeBlockOptions,
    ) -> Result<(CodeBlock, CodeBlock), ParseError> {
        let start = self.stream.cursor();
        let b1 = self.read_next_block(first)?;
        self.stream.set_cursor(start);
        let b2 = self.read_next_block(second)?;
        Ok((b1, b2))
    }

    // =========================================================================
    // Variable lists
    // =========================================================================

    /// Parse a type name: an identifier, optionally extended by `::` scope
    /// chains and an angle-bracketed argument list whose arguments are
    /// identifiers or integer literals.
    pub fn read_type_name(&mut self) -> Result<SmolStr, ParseError> {
        const M: &str = "DslEngine::read_var_list";
        let t = self.stream.current_or(M, "cannot read the variable type.")?;
        let mut type_name = t.value.to_string();
        if !is_valid_identifier(&type_name) {
            return Err(ParseError::new(
                M,
                format!("given type '{type_name}' is not valid."),
                Some(t.line),
            ));
        }
        self.stream.advance();
        self.stream.check_not_at_end(M, "")?;
        while self.stream.current().is_some_and(|t| t.value == "::") {
            self.stream.advance();
            let t = self.stream.current_or(M, "cannot read the variable type.")?;
            if !is_valid_identifier(&t.value) {
                return Err(ParseError::new(
                    M,
                    format!("given type '{}' is not valid.", t.value),
                    Some(t.line),
                ));
            }
            type_name.push_str("::");
            type_name.push_str(&t.value);
            self.stream.advance();
            self.stream.check_not_at_end(M, "")?;
        }
        if self.stream.current().is_some_and(|t| t.value == "<") {
            let mut open_brackets = 1u32;
            self.stream.advance();
            self.stream.check_not_at_end(M, "")?;
            type_name.push('<');
            while open_brackets != 0 {
                let t = self.stream.current_or(M, "unbalanced template arguments.")?;
                let arg = t.value.clone();
                if !is_valid_identifier(&arg) && !is_integer(&arg) {
                    return Err(ParseError::new(
                        M,
                        format!("given type '{arg}' is not valid."),
                        Some(t.line),
                    ));
                }
                self.stream.advance();
                self.stream.check_not_at_end(M, "")?;
                type_name.push_str(&arg);
                let (separator, separator_line) = {
                    let t = self.stream.current_or(M, "unbalanced template arguments.")?;
                    (t.value.clone(), t.line)
                };
                match separator.as_str() {
                    "," => {
                        self.stream.advance();
                        let t = self.stream.current_or(M, "unbalanced template arguments.")?;
                        if !is_valid_identifier(&t.value) && !is_integer(&t.value) {
                            return Err(ParseError::new(
                                M,
                                format!("given type '{}' is not valid.", t.value),
                                Some(t.line),
                            ));
                        }
                        type_name.push(',');
                    }
                    "<" => {
                        if is_integer(&arg) {
                            return Err(ParseError::new(
                                M,
                                format!("given type '{arg}' is not valid."),
                                Some(separator_line),
                            ));
                        }
                        open_brackets += 1;
                        self.stream.advance();
                        self.stream.check_not_at_end(M, "")?;
                        type_name.push('<');
                    }
                    ">" => {
                        open_brackets -= 1;
                        self.stream.advance();
                        self.stream.check_not_at_end(M, "")?;
                        type_name.push('>');
                    }
                    other => {
                        return Err(ParseError::new(
                            M,
                            format!("expected ',', '<' or '>', read '{other}'"),
                            Some(separator_line),
                        ));
                    }
                }
            }
        }
        Ok(SmolStr::new(type_name))
    }

    /// Parse `name[,name...];` declarations of a known type.
    ///
    /// Each name must be a valid identifier; `[expr]` array sizes are
    /// evaluated over the declared integer constants. The comment attached
    /// to the terminating `;` is propagated onto every variable of the
    /// statement.
    pub fn read_var_list_with_type(
        &mut self,
        type_name: SmolStr,
        allow_array: bool,
    ) -> Result<VariableDescriptionContainer, ParseError> {
        const M: &str = "DslEngine::read_var_list";
        let mut cont = VariableDescriptionContainer::default();
        let mut end_comment = String::new();
        let mut done = false;
        while !done {
            let t = self
                .stream
                .current_or(M, "expected ';' before end of file")?;
            let var_name = t.value.clone();
            let line = t.line;
            if !is_valid_identifier(&var_name) {
                return Err(ParseError::new(
                    M,
                    format!("variable given is not valid (read '{var_name}')."),
                    Some(line),
                ));
            }
            self.stream.advance();
            self.stream.check_not_at_end(M, "")?;
            let mut array_size = 1u32;
            if self.stream.current().is_some_and(|t| t.value == "[") {
                if !allow_array {
                    return Err(ParseError::new(
                        M,
                        format!("variable '{var_name}' can't be declared an array"),
                        Some(line),
                    ));
                }
                self.stream.advance();
                let mut body: Vec<SmolStr> = Vec::new();
                loop {
                    let t = self.stream.current_or(M, "expected ']'")?;
                    if t.value == "]" {
                        break;
                    }
                    if !matches!(t.flag, TokenFlag::Standard | TokenFlag::Number)
                        || t.value == ";"
                    {
                        return Err(ParseError::new(
                            M,
                            format!("invalid array size for '{var_name}'"),
                            Some(t.line),
                        ));
                    }
                    body.push(t.value.clone());
                    self.stream.advance();
                }
                if body.is_empty() {
                    return Err(ParseError::new(
                        M,
                        format!("empty array size for '{var_name}'"),
                        Some(line),
                    ));
                }
                let size = evaluate_integer_expression(&body, &self.integer_constants, M, line)?;
                if size <= 0 {
                    return Err(ParseError::new(
                        M,
                        format!("invalid array size for '{var_name}'"),
                        Some(line),
                    ));
                }
                array_size = size as u32;
                self.stream.read_specified_token(M, "]")?;
                self.stream.check_not_at_end(M, "")?;
            }
            let (separator, separator_comment, separator_line) = {
                let t = self.stream.current_or(M, "expected ',' or ';'")?;
                (t.value.clone(), t.comment.clone(), t.line)
            };
            match separator.as_str() {
                "," => self.stream.advance(),
                ";" => {
                    done = true;
                    end_comment = separator_comment;
                    self.stream.advance();
                }
                _ => {
                    return Err(ParseError::new(
                        M,
                        format!(", or ; expected after '{var_name}'"),
                        Some(separator_line),
                    ));
                }
            }
            let mut v = VariableDescription::new(type_name.clone(), var_name, array_size, line);
            if !self.current_comment.is_empty() {
                v.description = self.current_comment.clone();
            }
            cont.push(v);
        }
        if !end_comment.is_empty() {
            for v in cont.iter_mut() {
                if !v.description.is_empty() {
                    v.description.push(' ');
                }
                v.description.push_str(&end_comment);
            }
        }
        Ok(cont)
    }

    /// Parse `type name[,name...];`, reading the type first.
    pub fn read_var_list(
        &mut self,
        allow_array: bool,
    ) -> Result<VariableDescriptionContainer, ParseError> {
        let type_name = self.read_type_name()?;
        self.read_var_list_with_type(type_name, allow_array)
    }

    // =========================================================================
    // Initialisation values and parameters
    // =========================================================================

    /// Read an optional `= v`, `{v}` or `(v)` initializer.
    pub fn read_initialisation_value_f64(
        &mut self,
        operation: &str,
        name: &str,
        mandatory: bool,
    ) -> Result<Option<f64>, ParseError> {
        match self.read_initialisation_opening(operation, name, mandatory)? {
            None => Ok(None),
            Some(closing) => {
                let v = self.stream.read_double(operation)?;
                if let Some(c) = closing {
                    self.stream.read_specified_token(operation, c)?;
                }
                Ok(Some(v))
            }
        }
    }

    /// Integer variant of [`DslEngine::read_initialisation_value_f64`].
    pub fn read_initialisation_value_i64(
        &mut self,
        operation: &str,
        name: &str,
        mandatory: bool,
    ) -> Result<Option<i64>, ParseError> {
        match self.read_initialisation_opening(operation, name, mandatory)? {
            None => Ok(None),
            Some(closing) => {
                let v = self.stream.read_int(operation)?;
                if let Some(c) = closing {
                    self.stream.read_specified_token(operation, c)?;
                }
                Ok(Some(v))
            }
        }
    }

    /// Consume the opening of an initializer. `Ok(None)` when no initializer
    /// is present and none is required; the inner option is the expected
    /// closing delimiter.
    fn read_initialisation_opening(
        &mut self,
        operation: &str,
        name: &str,
        mandatory: bool,
    ) -> Result<Option<Option<&'static str>>, ParseError> {
        if mandatory {
            self.stream.check_not_at_end(
                operation,
                &format!("expected an initial value for '{name}'."),
            )?;
        }
        let closing = match self.stream.current().map(|t| t.value.as_str()) {
            Some("=") => None,
            Some("{") => Some("}"),
            Some("(") => Some(")"),
            _ => {
                if mandatory {
                    return Err(ParseError::new(
                        operation,
                        format!("expected '=', '{{' or '(' after '{name}'"),
                        self.stream.current_line(),
                    ));
                }
                return Ok(None);
            }
        };
        self.stream.advance();
        Ok(Some(closing))
    }

    /// Parse a `name [= value][,name...];` parameter list, returning the
    /// declared variables and their default values.
    pub fn handle_parameter(
        &mut self,
    ) -> Result<(VariableDescriptionContainer, Vec<(SmolStr, f64)>), ParseError> {
        const M: &str = "DslEngine::handle_parameter";
        let mut cont = VariableDescriptionContainer::default();
        let mut defaults = Vec::new();
        let mut done = false;
        while !done {
            let t = self
                .stream
                .current_or(M, "expected ';' before end of file")?;
            let name = t.value.clone();
            let line = t.line;
            if !is_valid_identifier(&name) {
                return Err(ParseError::new(
                    M,
                    format!("variable given is not valid (read '{name}')."),
                    Some(line),
                ));
            }
            self.stream.advance();
            self.stream.check_not_at_end(M, "")?;
            if let Some(value) = self.read_initialisation_value_f64(M, &name, false)? {
                if defaults.iter().any(|(n, _)| *n == name) {
                    return Err(ParseError::new(
                        M,
                        format!("default value already defined for parameter '{name}'"),
                        Some(line),
                    ));
                }
                defaults.push((name.clone(), value));
            }
            let (separator, separator_line) = {
                let t = self.stream.current_or(M, "expected ',' or ';'")?;
                (t.value.clone(), t.line)
            };
            match separator.as_str() {
                "," => self.stream.advance(),
                ";" => {
                    done = true;
                    self.stream.advance();
                }
                _ => {
                    return Err(ParseError::new(
                        M,
                        format!(", or ; expected after '{name}'"),
                        Some(separator_line),
                    ));
                }
            }
            cont.push(VariableDescription::new("real", name, 1, line));
        }
        Ok((cont, defaults))
    }

    // =========================================================================
    // Static variables and integer constants
    // =========================================================================

    /// Parse `type name = value;` and return the static variable.
    pub fn treat_static_var(&mut self) -> Result<StaticVariableDescription, ParseError> {
        const M: &str = "DslEngine::treat_static_var";
        let t = self
            .stream
            .current_or(M, "cannot read the type of the static variable.")?;
        let type_name = t.value.clone();
        if !is_valid_identifier(&type_name) {
            return Err(ParseError::new(M, "type given is not valid.", Some(t.line)));
        }
        self.stream.advance();
        let t = self.stream.current_or(M, "cannot read the variable name.")?;
        let name = t.value.clone();
        let line = t.line;
        if !is_valid_identifier(&name) {
            return Err(ParseError::new(
                M,
                format!("variable name '{name}' is not valid."),
                Some(line),
            ));
        }
        self.stream.advance();
        let value = self
            .read_initialisation_value_f64(M, &name, true)?
            .unwrap_or_else(|| unreachable!("mandatory initialisation value"));
        self.stream.read_specified_token(M, ";")?;
        Ok(StaticVariableDescription::new(
            type_name,
            name,
            line,
            StaticVariableValue::Real(value),
        ))
    }

    /// Parse `name = value;`, register the integer constant and return it
    /// as a static variable.
    pub fn treat_integer_constant(&mut self) -> Result<StaticVariableDescription, ParseError> {
        const M: &str = "DslEngine::treat_integer_constant";
        let t = self
            .stream
            .current_or(M, "cannot read the name of the constant.")?;
        let name = t.value.clone();
        let line = t.line;
        if !is_valid_identifier(&name) {
            return Err(ParseError::new(
                M,
                format!("variable name '{name}' is not valid."),
                Some(line),
            ));
        }
        self.stream.advance();
        let value = self
            .read_initialisation_value_i64(M, &name, true)?
            .unwrap_or_else(|| unreachable!("mandatory initialisation value"));
        self.stream.read_specified_token(M, ";")?;
        if self.integer_constants.insert(name.clone(), value).is_some() {
            return Err(ParseError::new(
                M,
                format!("variable '{name}' already declared"),
                Some(line),
            ));
        }
        Ok(StaticVariableDescription::new(
            "int",
            name,
            line,
            StaticVariableValue::Int(value),
        ))
    }

    // =========================================================================
    // File metadata
    // =========================================================================

    pub fn treat_author(&mut self) -> Result<(), ParseError> {
        self.file.author = self
            .stream
            .read_until_end_of_instruction("DslEngine::treat_author")?;
        Ok(())
    }

    pub fn treat_date(&mut self) -> Result<(), ParseError> {
        self.file.date = self
            .stream
            .read_until_end_of_instruction("DslEngine::treat_date")?;
        Ok(())
    }

    /// Parse a `{...}` description block into a starred comment, appended
    /// to the file description.
    pub fn treat_description(&mut self) -> Result<(), ParseError> {
        const M: &str = "DslEngine::treat_description";
        self.stream.read_specified_token(M, "{")?;
        self.stream
            .check_not_at_end(M, "file ended before the end of description.")?;
        let mut description = String::from("* ");
        let mut current_line = self.stream.current().map_or(0, |t| t.line);
        let mut depth = 1u32;
        loop {
            let Some(t) = self.stream.current() else {
                return Err(ParseError::new(
                    M,
                    "file ended before the end of description.",
                    self.stream.current_line(),
                ));
            };
            if t.value == "}" && depth == 1 {
                break;
            }
            // a brace preceded by a backslash-ended token is escaped
            let escaped = self
                .stream
                .previous()
                .is_some_and(|p| p.value.ends_with('\\'));
            if t.value == "{" && !escaped {
                depth += 1;
            }
            if t.value == "}" && !escaped {
                depth -= 1;
            }
            while current_line != t.line {
                description.push_str("\n* ");
                current_line += 1;
            }
            if t.flag == TokenFlag::String {
                description.push_str(t.string_content());
            } else {
                description.push_str(&t.value);
            }
            description.push(' ');
            self.stream.advance();
        }
        self.stream.advance();
        if !self.file.description.is_empty() {
            self.file.description.push('\n');
        }
        self.file.description.push_str(description.trim_end());
        Ok(())
    }

    /// An extra `;` between statements: tolerated, warned about in pedantic
    /// mode.
    pub fn treat_lonely_separator(&mut self) {
        if self.options.pedantic {
            warn!(
                file = %self.file.file_name,
                line = self.stream.previous().map_or(0, |t| t.line),
                "extra ';'"
            );
        }
    }

    // =========================================================================
    // Statement skipping
    // =========================================================================

    /// Skip a whole statement or balanced `{}` block, consuming a trailing
    /// `;` after a block when present.
    pub fn ignore_keyword(&mut self, key: &str) -> Result<(), ParseError> {
        const M: &str = "DslEngine::ignore_keyword";
        let context = format!("error while treating keyword '{key}'");
        loop {
            let t = self.stream.current_or(M, &context)?;
            if t.value == "{" || t.value == ";" {
                break;
            }
            self.stream.advance();
        }
        if self.stream.current().is_some_and(|t| t.value == "{") {
            let mut depth = 1u32;
            loop {
                self.stream.advance();
                let t = self.stream.current_or(M, &context)?;
                if t.value == "{" {
                    depth += 1;
                } else if t.value == "}" {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
            }
            // consume an optional trailing ';'
            self.stream.advance();
            if self.stream.current().is_some_and(|t| t.value == ";") {
                self.stream.advance();
            }
        } else {
            self.stream.advance();
        }
        Ok(())
    }

    // =========================================================================
    // Targets
    // =========================================================================

    /// Fold the targets of recursively imported files into this
    /// compilation's targets, adding cross-dependencies between
    /// co-generated targets first.
    pub fn complete_targets_description(&mut self) -> Result<(), ParseError> {
        for imported in &self.imported_targets {
            for il in imported.libraries() {
                for l in self.targets.libraries_mut() {
                    if l.name != il.name {
                        insert_if(&mut l.dependencies, &il.name);
                    }
                }
            }
        }
        let imported = std::mem::take(&mut self.imported_targets);
        for t in &imported {
            merge_targets_description(&mut self.targets, t)?;
        }
        Ok(())
    }
}

fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(source: &str) -> DslEngine {
        let mut e = DslEngine::new(CompilerOptions::new());
        e.open_string(source, "test.mfront").unwrap();
        e
    }

    fn block_options(members: &[&str], statics: &[&str]) -> CodeBlockOptions {
        let mut o = CodeBlockOptions::default();
        o.member_names = members.iter().map(|m| SmolStr::new(m)).collect();
        o.static_member_names = statics.iter().map(|m| SmolStr::new(m)).collect();
        o
    }

    #[test]
    fn test_read_next_block_qualifies_members() {
        let mut e = engine("{ a = b ; }");
        let mut o = block_options(&["a", "b"], &[]);
        o.qualify_member_variables = true;
        o.register_line = false;
        let b = e.read_next_block(&mut o).unwrap();
        assert_eq!(b.code, "this->a = this->b ; ");
        assert!(b.members.contains("a"));
        assert!(b.members.contains("b"));
    }

    #[test]
    fn test_read_next_block_no_qualification_after_member_access() {
        let mut e = engine("{ c.a = p->b + s::a ; }");
        let mut o = block_options(&["a", "b"], &[]);
        o.qualify_member_variables = true;
        o.register_line = false;
        let b = e.read_next_block(&mut o).unwrap();
        assert_eq!(b.code, "c . a = p -> b + s :: a ; ");
    }

    #[test]
    fn test_read_next_block_static_qualification() {
        let mut e = engine("{ x = C ; }");
        let mut o = block_options(&[], &["C"]);
        o.qualify_static_variables = true;
        o.register_line = false;
        e.set_class_name("Norton");
        let b = e.read_next_block(&mut o).unwrap();
        assert_eq!(b.code, "x = Norton::C ; ");
        assert!(b.static_members.contains("C"));
    }

    #[test]
    fn test_read_next_block_round_trip() {
        let mut e = engine("{ if ( x > 0 ) { y = x ; } }");
        let mut o = CodeBlockOptions::default();
        o.register_line = false;
        let b = e.read_next_block(&mut o).unwrap();
        assert_eq!(b.code, "if ( x > 0 ) { y = x ; } ");
    }

    #[test]
    fn test_read_next_block_line_markers() {
        let mut e = engine("{ a ;\n b ; }");
        let mut o = CodeBlockOptions::default();
        let b = e.read_next_block(&mut o).unwrap();
        assert!(b.code.starts_with("#line 1 \"test.mfront\"\n"));
        assert!(b.code.contains("\n#line 2 \"test.mfront\"\n"));
    }

    #[test]
    fn test_read_next_block_debug_mode_suppresses_markers() {
        let mut options = CompilerOptions::new();
        options.debug = true;
        let mut e = DslEngine::new(options);
        e.open_string("{ a ;\n b ; }", "test.mfront").unwrap();
        let b = e.read_next_block(&mut CodeBlockOptions::default()).unwrap();
        assert_eq!(b.code, "a ; \nb ; ");
    }

    #[test]
    fn test_read_next_block_semicolon_policed() {
        let mut e = engine("{ a ; }");
        let mut o = CodeBlockOptions::default();
        o.allow_semicolon = false;
        let err = e.read_next_block(&mut o).unwrap_err();
        assert!(err.message.contains("read ';' before the end of block"));
        assert!(err.message.contains("blocks opened"));
    }

    #[test]
    fn test_read_next_block_unterminated() {
        let mut e = engine("{ a = { b ");
        let err = e.read_next_block(&mut CodeBlockOptions::default()).unwrap_err();
        assert!(err.message.contains("Number of blocks opened: 1"));
    }

    #[test]
    fn test_read_next_block_collects_comments() {
        let mut e = engine("{ a ; // updates a\n}");
        let mut o = CodeBlockOptions::default();
        let b = e.read_next_block(&mut o).unwrap();
        assert_eq!(b.description, "updates a");
    }

    #[test]
    fn test_read_next_block_pair() {
        let mut e = engine("{ a ; } @Next");
        let mut o1 = block_options(&["a"], &[]);
        o1.qualify_member_variables = true;
        o1.register_line = false;
        let mut o2 = block_options(&["a"], &[]);
        o2.register_line = false;
        let (b1, b2) = e.read_next_block_pair(&mut o1, &mut o2).unwrap();
        assert_eq!(b1.code, "this->a ; ");
        assert_eq!(b2.code, "a ; ");
        assert_eq!(e.stream.current().unwrap().value, "@Next");
    }

    #[test]
    fn test_read_var_list_trailing_comment_propagates() {
        let mut e = engine("young,nu; // elastic properties\n@Next");
        let vars = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap();
        assert_eq!(vars.len(), 2);
        for v in &vars {
            assert_eq!(v.description, "elastic properties");
        }
    }

    #[test]
    fn test_read_var_list_array_size_expression() {
        let mut e = engine("ivs[2+2];");
        let vars = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap();
        assert_eq!(vars.get("ivs").unwrap().array_size, 4);
    }

    #[test]
    fn test_read_var_list_unknown_constant() {
        let mut e = engine("ivs[N];");
        let err = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap_err();
        assert!(err.message.contains("unknown constant 'N'"));
    }

    #[test]
    fn test_read_var_list_declared_constant() {
        let mut e = engine("@IntegerConstant N = 3;\nivs[2*N];");
        e.stream.advance(); // skip the keyword, as the dispatch loop would
        e.treat_integer_constant().unwrap();
        let vars = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap();
        assert_eq!(vars.get("ivs").unwrap().array_size, 6);
    }

    #[test]
    fn test_read_var_list_empty_array_size() {
        let mut e = engine("ivs[];");
        let err = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap_err();
        assert!(err.message.contains("empty array size"));
    }

    #[test]
    fn test_read_var_list_non_positive_array_size() {
        let mut e = engine("ivs[1-1];");
        let err = e
            .read_var_list_with_type(SmolStr::new("real"), true)
            .unwrap_err();
        assert!(err.message.contains("invalid array size"));
    }

    #[test]
    fn test_read_var_list_array_forbidden() {
        let mut e = engine("a[2];");
        let err = e
            .read_var_list_with_type(SmolStr::new("real"), false)
            .unwrap_err();
        assert!(err.message.contains("can't be declared an array"));
    }

    #[test]
    fn test_read_var_list_missing_semicolon() {
        let mut e = engine("a, b");
        assert!(
            e.read_var_list_with_type(SmolStr::new("real"), true)
                .is_err()
        );
    }

    #[test]
    fn test_read_type_name_scoped_and_templated() {
        let mut e = engine("matforge::math::tvector<3,real> v;");
        let t = e.read_type_name().unwrap();
        assert_eq!(t, "matforge::math::tvector<3,real>");
        let vars = e.read_var_list_with_type(t, true).unwrap();
        assert_eq!(vars.get("v").unwrap().type_name, "matforge::math::tvector<3,real>");
    }

    #[test]
    fn test_read_type_name_nested_template() {
        // '>>' would lex as a shift operator, so nested arguments are
        // closed with separated brackets
        let mut e = engine("st2tost2<N,tvector<3,real> > x;");
        let t = e.read_type_name().unwrap();
        assert_eq!(t, "st2tost2<N,tvector<3,real>>");
    }

    #[test]
    fn test_read_type_name_invalid_argument() {
        let mut e = engine("tvector<+,real> x;");
        assert!(e.read_type_name().is_err());
    }

    #[test]
    fn test_handle_parameter_defaults() {
        let mut e = engine("A = 8.e-67, E{ 8.2 }, m(1.);");
        let (vars, defaults) = e.handle_parameter().unwrap();
        assert_eq!(vars.len(), 3);
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults[0], (SmolStr::new("A"), 8e-67));
        assert_eq!(defaults[1].1, 8.2);
    }

    #[test]
    fn test_treat_static_var() {
        let mut e = engine("real C = 4.2;");
        let v = e.treat_static_var().unwrap();
        assert_eq!(v.name, "C");
        assert_eq!(v.value, StaticVariableValue::Real(4.2));
    }

    #[test]
    fn test_treat_integer_constant_duplicate() {
        let mut e = engine("N = 3; N = 4;");
        e.treat_integer_constant().unwrap();
        let err = e.treat_integer_constant().unwrap_err();
        assert!(err.message.contains("already declared"));
    }

    #[test]
    fn test_treat_description() {
        let mut e = engine("{ The Norton creep law.\nSecond line. }");
        e.treat_description().unwrap();
        assert!(e.file.description.starts_with("* The Norton creep law"));
        assert!(e.file.description.contains("\n* Second line"));
    }

    #[test]
    fn test_ignore_keyword_statement_and_block() {
        let mut e = engine("some words ; @Next");
        e.ignore_keyword("@Unknown").unwrap();
        assert_eq!(e.stream.current().unwrap().value, "@Next");

        let mut e = engine("{ nested { } } ; @Next");
        e.ignore_keyword("@Unknown").unwrap();
        assert_eq!(e.stream.current().unwrap().value, "@Next");
    }

    #[test]
    fn test_open_string_substitutions_and_external_commands() {
        let mut e = DslEngine::new(CompilerOptions::new());
        let subs: FxHashMap<String, String> =
            [("__LAW__".to_owned(), "Norton".to_owned())].into_iter().collect();
        e.load_source(
            "@Behaviour __LAW__;",
            "test.mfront",
            &["@UseQt true;".to_owned()],
            &subs,
        )
        .unwrap();
        let values: Vec<_> = (0..e.stream.len())
            .map(|_| {
                let v = e.stream.current().unwrap().value.clone();
                e.stream.advance();
                v
            })
            .collect();
        assert_eq!(
            values,
            ["@UseQt", "true", ";", "@Behaviour", "Norton", ";"]
        );
    }
}
