//! Host-language parser
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens, terminators inserted at significant newlines
//!     ↓
//! Parser → typed syntax tree (crate::syntax::ast)
//! ```
//!
//! Build constraints live next to the parser because they are read from the
//! same file header.

mod constraint;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;

use thiserror::Error;

use crate::base::Position;

pub use constraint::BuildContext;
pub use lexer::{Comment, LexError, Token, TokenKind, Tokens, tokenize};
pub use parser::{parse_expr, parse_file};

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {message}")]
pub struct ParseError {
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests;
