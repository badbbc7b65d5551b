//! Logos-based lexer for the matforge DSL
//!
//! Fast tokenization using the logos crate. The raw token stream is
//! post-processed into [`Token`] values: whitespace disappears, and comments
//! are folded into the `comment` field of a neighbouring token so keyword
//! handlers can reattach them to declarations as documentation.

use logos::Logos;
use smol_str::SmolStr;
use text_size::TextSize;

use crate::base::LineIndex;

use super::error::ParseError;

/// Syntactic flavor of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenFlag {
    /// Identifier, keyword, punctuation, `@Keyword` word
    #[default]
    Standard,
    /// Quote-delimited string literal, delimiters included in `value`
    String,
    /// A comment (never emitted into the stream, see module docs)
    Comment,
    /// Single-quoted character literal
    Char,
    /// Integer or floating-point literal
    Number,
}

/// A lexical token with its value, position and attached documentation.
///
/// Immutable once produced. The `comment` field carries the text of source
/// comments folded onto this token: a comment on the same line as a
/// preceding token attaches to that token, a comment on its own line
/// attaches to the next token produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: SmolStr,
    pub line: u32,
    pub offset: TextSize,
    pub flag: TokenFlag,
    pub comment: String,
}

impl Token {
    /// Content of a string literal, without the delimiters.
    pub fn string_content(&self) -> &str {
        let v = self.value.as_str();
        &v[1..v.len() - 1]
    }
}

/// Tokenize a whole source text.
///
/// Fails with a [`ParseError`] on unrecognized characters, unterminated
/// strings and unterminated block comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let index = LineIndex::new(source);
    let mut tokens: Vec<Token> = Vec::new();
    let mut pending_comment = String::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(raw) = lexer.next() {
        let span = lexer.span();
        let offset = TextSize::new(span.start as u32);
        let line = index.line(offset);
        let raw = raw.map_err(|()| {
            ParseError::new(
                "tokenize",
                format!("unrecognized character '{}'", lexer.slice()),
                Some(line),
            )
        })?;
        match raw {
            RawToken::Whitespace => {}
            RawToken::LineComment | RawToken::BlockComment => {
                let text = clean_comment(lexer.slice());
                match tokens.last_mut() {
                    Some(last) if last.line == line => append_line(&mut last.comment, &text),
                    _ => append_line(&mut pending_comment, &text),
                }
            }
            RawToken::UnterminatedComment => {
                return Err(ParseError::new(
                    "tokenize",
                    "unterminated comment",
                    Some(line),
                ));
            }
            RawToken::UnterminatedString => {
                return Err(ParseError::new(
                    "tokenize",
                    "unterminated string literal",
                    Some(line),
                ));
            }
            _ => {
                tokens.push(Token {
                    value: SmolStr::new(lexer.slice()),
                    line,
                    offset,
                    flag: raw.flag(),
                    comment: std::mem::take(&mut pending_comment),
                });
            }
        }
    }
    Ok(tokens)
}

fn append_line(acc: &mut String, text: &str) {
    if !acc.is_empty() {
        acc.push('\n');
    }
    acc.push_str(text);
}

/// Strip comment delimiters and per-line decoration.
fn clean_comment(raw: &str) -> String {
    let inner = if let Some(s) = raw.strip_prefix("//") {
        s
    } else {
        raw.trim_start_matches("/*").trim_end_matches("*/")
    };
    inner
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Logos token enum - raw lexical shapes of the DSL
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // Unterminated forms: shorter matches that only win when the terminated
    // regex above cannot match.
    #[token("/*")]
    UnterminatedComment,

    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"@?[a-zA-Z_][a-zA-Z0-9_]*")]
    Word,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    #[regex(r"'([^'\\]|\\.)'")]
    CharLit,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("::")]
    ColonColon,

    #[token("->")]
    Arrow,

    #[token("<<")]
    ShiftLeft,

    #[token(">>")]
    ShiftRight,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("&&")]
    AmpAmp,

    #[token("||")]
    PipePipe,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("@")]
    At,
    #[token("#")]
    Hash,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token("!")]
    Bang,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("\\")]
    Backslash,
}

impl RawToken {
    fn flag(self) -> TokenFlag {
        match self {
            RawToken::StringLit => TokenFlag::String,
            RawToken::CharLit => TokenFlag::Char,
            RawToken::Number => TokenFlag::Number,
            RawToken::LineComment | RawToken::BlockComment => TokenFlag::Comment,
            _ => TokenFlag::Standard,
        }
    }
}

/// Predicate for DSL identifiers: an XID-start character or `_`, followed by
/// XID-continue characters, restricted to the ASCII convention of the
/// generated-code toolchains.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || (first.is_ascii() && unicode_ident::is_xid_start(first))) {
        return false;
    }
    chars.all(|c| c.is_ascii() && (c == '_' || unicode_ident::is_xid_continue(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_keyword_statement() {
        let tokens = tokenize("@Author John Doe;").unwrap();
        let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["@Author", "John", "Doe", ";"]);
        assert!(tokens.iter().all(|t| t.flag == TokenFlag::Standard));
    }

    #[test]
    fn test_lex_string_literal() {
        let tokens = tokenize(r#"@Law "Young";"#).unwrap();
        assert_eq!(tokens[1].flag, TokenFlag::String);
        assert_eq!(tokens[1].string_content(), "Young");
    }

    #[test]
    fn test_lex_numbers() {
        let tokens = tokenize("1.2e-3 42 .5").unwrap();
        // the sign of the exponent belongs to the number token
        assert_eq!(tokens[0].value, "1.2e-3");
        assert!(tokens.iter().all(|t| t.flag == TokenFlag::Number));
    }

    #[test]
    fn test_lex_lines() {
        let tokens = tokenize("a\nb\n\nc").unwrap();
        let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, [1, 2, 4]);
    }

    #[test]
    fn test_comment_attaches_to_next_token() {
        let tokens = tokenize("// the Young modulus\n@MaterialProperty stress young;").unwrap();
        assert_eq!(tokens[0].value, "@MaterialProperty");
        assert_eq!(tokens[0].comment, "the Young modulus");
    }

    #[test]
    fn test_trailing_comment_attaches_to_previous_token() {
        let tokens = tokenize("real a; // in MPa\nreal b;").unwrap();
        let semi = tokens.iter().find(|t| t.value == ";").unwrap();
        assert_eq!(semi.comment, "in MPa");
        assert_eq!(tokens.iter().filter(|t| t.value == "b").count(), 1);
    }

    #[test]
    fn test_block_comment_cleaned() {
        let tokens = tokenize("/* first\n * second\n */ x").unwrap();
        assert_eq!(tokens[0].value, "x");
        assert_eq!(tokens[0].comment, "first\nsecond");
    }

    #[test]
    fn test_scope_and_member_access_tokens() {
        let tokens = tokenize("a::b->c.d").unwrap();
        let values: Vec<_> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["a", "::", "b", "->", "c", ".", "d"]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("@Law \"Young").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("x /* no end").unwrap_err();
        assert!(err.message.contains("unterminated comment"));
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("young"));
        assert!(is_valid_identifier("_tmp0"));
        assert!(!is_valid_identifier("2young"));
        assert!(!is_valid_identifier("@Law"));
        assert!(!is_valid_identifier(""));
    }
}
