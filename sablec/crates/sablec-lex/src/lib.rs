//! sablec-lex - Tokenizer for the sable language.
//!
//! Transforms source text into a flat, append-only token stream. The
//! tokenizer is a small state machine: besides the ordinary token state it
//! tracks line starts (for indentation tokens) and the template-string /
//! template-expression lifecycle used by string interpolation.
//!
//! Tokens never own text; they record byte offsets into the source, so
//! `src[token.start()..token.end()]` is always the exact lexeme.

pub mod cursor;
pub mod token;
pub mod tokenizer;
mod unescape;

pub use token::{
    keyword, OperatorKind, Payload, Token, TokenId, TokenKind, TAB_INDENT_OFFSET,
};
pub use tokenizer::{tokenize, TokenizeOptions, Tokenizer};
pub use unescape::unescape_string;

use thiserror::Error;

/// A lexical error, with the byte position where scanning stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A character no lexeme rule accepts.
    #[error("unrecognized character `{ch}`")]
    UnrecognizedChar { ch: char, pos: u32 },

    /// A string literal that reaches the end of input, or a newline for
    /// single-line delimiters, before its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString { pos: u32 },

    /// A malformed number literal.
    #[error("{msg}")]
    BadNumber { msg: &'static str, pos: u32 },

    /// A malformed rune literal.
    #[error("{msg}")]
    BadRune { msg: &'static str, pos: u32 },
}

impl LexError {
    /// Byte position where the error was detected.
    pub fn pos(&self) -> u32 {
        match *self {
            LexError::UnrecognizedChar { pos, .. } => pos,
            LexError::UnterminatedString { pos } => pos,
            LexError::BadNumber { pos, .. } => pos,
            LexError::BadRune { pos, .. } => pos,
        }
    }
}

#[cfg(test)]
mod edge_cases;
