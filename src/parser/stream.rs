//! Token stream and cursor
//!
//! The stream owns the ordered token sequence produced by the lexer and a
//! cursor into it. All primitive read operations used by keyword handlers
//! live here; composite operations (variable lists, code blocks) are built
//! on top by the DSL engine.

use smol_str::SmolStr;

use super::error::ParseError;
use super::lexer::{Token, TokenFlag};

/// An ordered token sequence with a cursor.
///
/// Append-only during lexing; insertion-mutable only when splicing external
/// command text in front of the cursor. The cursor always lies in
/// `[0, len]`, with `len` acting as the end sentinel.
#[derive(Debug, Default, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Token under the cursor.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Token immediately before the cursor.
    pub fn previous(&self) -> Option<&Token> {
        self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reset the cursor to an earlier position (two-pass block parsing).
    pub fn set_cursor(&mut self, cursor: usize) {
        debug_assert!(cursor <= self.tokens.len());
        self.cursor = cursor.min(self.tokens.len());
    }

    /// Splice tokens in front of the cursor, e.g. externally supplied
    /// command text. Tokens after the cursor are unaffected.
    pub fn insert_before_cursor(&mut self, tokens: Vec<Token>) {
        let at = self.cursor;
        self.tokens.splice(at..at, tokens);
    }

    /// Line of the token under the cursor, falling back to the last token.
    pub fn current_line(&self) -> Option<u32> {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
    }

    fn error(&self, operation: &str, message: impl Into<String>) -> ParseError {
        ParseError::new(operation, message, self.current_line())
    }

    // =========================================================================
    // Primitive read operations
    // =========================================================================

    /// Fail with an unexpected-end-of-stream error if the cursor is at the
    /// end sentinel.
    pub fn check_not_at_end(&self, operation: &str, expected: &str) -> Result<(), ParseError> {
        if self.at_end() {
            let mut message = String::from("unexpected end of file.");
            if !expected.is_empty() {
                message.push('\n');
                message.push_str(expected);
            }
            return Err(self.error(operation, message));
        }
        Ok(())
    }

    /// Current token, or an unexpected-end-of-stream error.
    pub fn current_or(&self, operation: &str, expected: &str) -> Result<&Token, ParseError> {
        self.check_not_at_end(operation, expected)?;
        Ok(&self.tokens[self.cursor])
    }

    /// Consume the current token, which must have exactly the given value.
    pub fn read_specified_token(&mut self, operation: &str, value: &str) -> Result<(), ParseError> {
        let t = self.current_or(operation, &format!("expected '{value}'."))?;
        if t.value != value {
            return Err(self.error(
                operation,
                format!("expected '{value}', read '{}'.", t.value),
            ));
        }
        self.advance();
        Ok(())
    }

    /// Consume one token followed by `;` and return its value.
    pub fn read_only_one_token(&mut self, operation: &str) -> Result<SmolStr, ParseError> {
        let t = self.current_or(operation, "expected a word.")?;
        if t.value == ";" {
            return Err(self.error(operation, "no word read"));
        }
        let value = t.value.clone();
        self.advance();
        self.read_specified_token(operation, ";")?;
        Ok(value)
    }

    /// Concatenate token values up to (and consuming) the next `;`.
    ///
    /// Words beginning with `@` are rejected: a keyword cannot appear in the
    /// middle of an instruction.
    pub fn read_until_end_of_instruction(&mut self, operation: &str) -> Result<String, ParseError> {
        let mut res = String::new();
        while let Some(t) = self.current() {
            if t.value == ";" {
                break;
            }
            if t.value.starts_with('@') {
                return Err(self.error(operation, "no word beginning with '@' is allowed here"));
            }
            if !res.is_empty() {
                res.push(' ');
            }
            res.push_str(&t.value);
            self.advance();
        }
        self.check_not_at_end(operation, "missing ';' delimiter.")?;
        self.advance();
        Ok(res)
    }

    /// Read a string literal, returning its content without delimiters.
    pub fn read_string(&mut self, operation: &str) -> Result<String, ParseError> {
        let t = self.current_or(operation, "expected a string.")?;
        if t.flag != TokenFlag::String {
            return Err(self.error(operation, "expected a string"));
        }
        let content = t.string_content().to_owned();
        self.advance();
        Ok(content)
    }

    /// Read the literal word `true` or `false`.
    pub fn read_boolean_value(&mut self, operation: &str) -> Result<bool, ParseError> {
        let t = self.current_or(operation, "expected a boolean value.")?;
        let b = match t.value.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(self.error(
                    operation,
                    format!("expected to read 'true' or 'false' (read '{other}')"),
                ));
            }
        };
        self.advance();
        Ok(b)
    }

    /// Read a floating-point value, accepting a leading sign token.
    pub fn read_double(&mut self, operation: &str) -> Result<f64, ParseError> {
        let sign = self.read_sign(operation)?;
        let t = self.current_or(operation, "expected a number.")?;
        if t.flag != TokenFlag::Number {
            return Err(self.error(operation, format!("expected a number, read '{}'", t.value)));
        }
        let v: f64 = t
            .value
            .parse()
            .map_err(|_| self.error(operation, format!("could not convert '{}'", t.value)))?;
        self.advance();
        Ok(sign * v)
    }

    /// Read an integer value, accepting a leading sign token.
    pub fn read_int(&mut self, operation: &str) -> Result<i64, ParseError> {
        let sign = self.read_sign(operation)?;
        let t = self.current_or(operation, "expected an integer.")?;
        let v: i64 = t
            .value
            .parse()
            .map_err(|_| self.error(operation, format!("could not read integer '{}'", t.value)))?;
        self.advance();
        Ok(sign as i64 * v)
    }

    fn read_sign(&mut self, operation: &str) -> Result<f64, ParseError> {
        let t = self.current_or(operation, "expected a number.")?;
        let sign = match t.value.as_str() {
            "-" => Some(-1.0),
            "+" => Some(1.0),
            _ => None,
        };
        if let Some(s) = sign {
            self.advance();
            return Ok(s);
        }
        Ok(1.0)
    }

    /// Read an unsigned short value.
    pub fn read_unsigned_short(&mut self, operation: &str) -> Result<u16, ParseError> {
        let t = self.current_or(operation, "cannot read unsigned short value.")?;
        let v: u16 = t.value.parse().map_err(|_| {
            self.error(operation, "failed to read unsigned short value.")
        })?;
        self.advance();
        Ok(v)
    }

    /// Read a possibly empty, comma-separated, delimited list of tokens.
    ///
    /// With `allow_empty_at_eof`, an end-of-stream before the opening
    /// delimiter yields an empty list. A missing opening delimiter yields an
    /// empty list without consuming anything; a dangling comma is an error.
    pub fn read_list(
        &mut self,
        operation: &str,
        open: &str,
        close: &str,
        allow_empty_at_eof: bool,
    ) -> Result<Vec<Token>, ParseError> {
        let mut items = Vec::new();
        if self.at_end() && allow_empty_at_eof {
            return Ok(items);
        }
        self.check_not_at_end(operation, &format!("expected '{open}'"))?;
        if self.current().is_none_or(|t| t.value != open) {
            return Ok(items);
        }
        self.read_specified_token(operation, open)?;
        loop {
            let t = self.current_or(operation, &format!("expected '{close}'"))?;
            if t.value == close {
                break;
            }
            items.push(t.clone());
            self.advance();
            let t = self.current_or(operation, &format!("expected '{close}'"))?;
            if t.value != close && t.value != "," {
                return Err(self.error(
                    operation,
                    format!("expected ',' or '{close}', read '{}'", t.value),
                ));
            }
            if t.value == "," {
                self.advance();
                let t = self.current_or(operation, &format!("expected '{close}'"))?;
                if t.value == close {
                    return Err(self.error(operation, "expected a new item"));
                }
            }
        }
        self.advance();
        Ok(items)
    }

    /// Read a `{ "a", "b" }` list of string literals.
    pub fn read_array_of_string(&mut self, operation: &str) -> Result<Vec<String>, ParseError> {
        let items = self.read_list(operation, "{", "}", false)?;
        let mut res = Vec::with_capacity(items.len());
        for t in items {
            if t.flag != TokenFlag::String {
                return Err(ParseError::new(operation, "expected a string", Some(t.line)));
            }
            res.push(t.string_content().to_owned());
        }
        Ok(res)
    }

    /// Read a `{ 1.2, 3.4 }` list of numeric literals.
    pub fn read_array_of_double(&mut self, operation: &str) -> Result<Vec<f64>, ParseError> {
        let items = self.read_list(operation, "{", "}", false)?;
        let mut res = Vec::with_capacity(items.len());
        for t in items {
            if t.flag != TokenFlag::Number {
                return Err(ParseError::new(operation, "expected a number", Some(t.line)));
            }
            let v: f64 = t.value.parse().map_err(|_| {
                ParseError::new(
                    operation,
                    format!("could not convert '{}'", t.value),
                    Some(t.line),
                )
            })?;
            res.push(v);
        }
        Ok(res)
    }

    /// Read either a single string literal or a braced array of strings.
    pub fn read_string_or_array_of_string(
        &mut self,
        operation: &str,
    ) -> Result<Vec<String>, ParseError> {
        let t = self.current_or(operation, "expected a string or '{'")?;
        if t.value == "{" {
            return self.read_array_of_string(operation);
        }
        Ok(vec![self.read_string(operation)?])
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn stream(source: &str) -> TokenStream {
        TokenStream::new(tokenize(source).unwrap())
    }

    #[test]
    fn test_read_specified_token() {
        let mut s = stream("{ }");
        s.read_specified_token("t", "{").unwrap();
        let err = s.read_specified_token("t", ";").unwrap_err();
        assert!(err.message.contains("expected ';'"));
        assert!(err.message.contains("read '}'"));
    }

    #[test]
    fn test_read_until_end_of_instruction() {
        let mut s = stream("John Doe ; rest");
        assert_eq!(s.read_until_end_of_instruction("t").unwrap(), "John Doe");
        assert_eq!(s.current().unwrap().value, "rest");
    }

    #[test]
    fn test_read_until_end_rejects_keyword() {
        let mut s = stream("John @Date;");
        let err = s.read_until_end_of_instruction("t").unwrap_err();
        assert!(err.message.contains('@'));
    }

    #[test]
    fn test_read_only_one_token() {
        let mut s = stream("Norton;");
        assert_eq!(s.read_only_one_token("t").unwrap(), "Norton");
        let mut s = stream(";");
        assert!(s.read_only_one_token("t").is_err());
    }

    #[test]
    fn test_read_double_signed() {
        let mut s = stream("- 1.5");
        assert_eq!(s.read_double("t").unwrap(), -1.5);
    }

    #[test]
    fn test_read_list() {
        let mut s = stream("{a, b, c}");
        let items = s.read_list("t", "{", "}", false).unwrap();
        let values: Vec<_> = items.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["a", "b", "c"]);
    }

    #[test]
    fn test_read_list_empty() {
        let mut s = stream("{}");
        assert!(s.read_list("t", "{", "}", false).unwrap().is_empty());
    }

    #[test]
    fn test_read_list_dangling_comma() {
        let mut s = stream("{a, }");
        let err = s.read_list("t", "{", "}", false).unwrap_err();
        assert!(err.message.contains("expected a new item"));
    }

    #[test]
    fn test_read_array_of_string_rejects_word() {
        let mut s = stream("{\"a\", b}");
        assert!(s.read_array_of_string("t").is_err());
    }

    #[test]
    fn test_read_string_or_array_accepts_bare_string() {
        let mut s = stream("\"one\" ;");
        assert_eq!(s.read_string_or_array_of_string("t").unwrap(), ["one"]);
    }

    #[test]
    fn test_insert_before_cursor() {
        let mut s = stream("c d");
        let pre = tokenize("a b").unwrap();
        s.insert_before_cursor(pre);
        assert_eq!(s.current().unwrap().value, "a");
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_end_of_stream_error_cites_last_line() {
        let mut s = stream("a\nb");
        s.advance();
        s.advance();
        let err = s.read_specified_token("t", ";").unwrap_err();
        assert_eq!(err.line, Some(2));
    }
}
