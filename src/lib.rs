//! # matforge-base
//!
//! Core library for the matforge material-behaviour DSL: tokenizer,
//! keyword-driven parser, description models, and multi-target code
//! generation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project    → driver: DSL selection, whole-file analysis, generation
//!   ↓
//! dsl        → DSL variants: keyword tables over the base engine
//!   ↓
//! interfaces → code-generation contract, registry, targets descriptions
//!   ↓
//! model      → description models and their invariants
//!   ↓
//! parser     → logos lexer, token stream, base engine, parse errors
//!   ↓
//! base       → primitives (positions, line index, text ranges)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → model → interfaces → dsl →
// project)
// ============================================================================

/// Foundation types: positions, line index, TextRange
pub mod base;

/// Parser: logos lexer, token stream, DSL base engine
pub mod parser;

/// Description models: behaviours, material properties, attributes
pub mod model;

/// Code-generation interfaces, registry and targets descriptions
pub mod interfaces;

/// DSL variants: behaviour DSL, material-property DSL
pub mod dsl;

/// Driver: file lookup, options, whole-file analysis
pub mod project;

// Re-export commonly needed items
pub use dsl::{BehaviourDsl, MaterialPropertyDsl};
pub use parser::{DslError, ParseError};
pub use project::{Analysis, CompilerOptions, SearchPaths};

// Re-export foundation types
pub use base::{LineCol, LineIndex, TextRange, TextSize};
