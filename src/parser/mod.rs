//! Tokenizer and DSL base engine
//!
//! This module provides:
//! - **logos** based lexing into a flat token sequence with per-token
//!   comments and line tracking
//! - the [`TokenStream`] cursor and the primitive read operations
//! - the [`DslEngine`] composite operations every keyword handler builds on
//!   (variable lists, code blocks, initialisation values, imports state)
//! - the integer-constant expression evaluator for array sizes

pub mod code_block;
pub mod engine;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod stream;

pub use code_block::{CodeBlock, CodeBlockOptions, VariableModifier, WordAnalyser};
pub use engine::{DslEngine, SourceState};
pub use error::{DslError, ParseError};
pub use lexer::{Token, TokenFlag, is_valid_identifier, tokenize};
pub use stream::TokenStream;
