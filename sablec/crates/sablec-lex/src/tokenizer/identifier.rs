//! Identifier, keyword, and symbol-literal lexing.

use super::core::Tokenizer;
use crate::token::{keyword, Payload, TokenKind};
use crate::LexError;

/// First character of an identifier.
pub(super) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Continuation character of an identifier.
pub(super) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Tokenizer<'_, '_> {
    /// Lexes an identifier, then matches it against the keyword table.
    ///
    /// Emits either the matching keyword kind or `ident`; both record the
    /// full lexeme range.
    pub(super) fn lex_identifier(&mut self) {
        let start = self.cursor.position();
        debug_assert!(is_ident_start(self.cursor.current_char()));

        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let end = self.cursor.position();
        let text = self.cursor.slice_from(start);
        let kind = keyword(text).unwrap_or(TokenKind::Ident);
        self.push_token(kind, start, Payload::End(end as u32));
    }

    /// Lexes a `#name` symbol literal as a single token covering the `#`.
    pub(super) fn lex_symbol(&mut self) -> Result<(), LexError> {
        let start = self.cursor.position();
        self.cursor.advance();

        let mut len = 0usize;
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
            len += 1;
        }

        if len == 0 {
            return self.fail(
                LexError::UnrecognizedChar {
                    ch: '#',
                    pos: start as u32,
                },
                start,
            );
        }

        let end = self.cursor.position();
        self.push_token(TokenKind::Symbol, start, Payload::End(end as u32));
        Ok(())
    }
}
