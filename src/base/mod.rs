//! Foundation types for the matforge toolchain.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Byte offset to line/column conversion
//!
//! This module has NO dependencies on other matforge modules.

mod position;

pub use position::{LineCol, LineIndex};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
