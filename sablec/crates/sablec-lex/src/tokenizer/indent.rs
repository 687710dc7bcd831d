//! Line starts: indentation tokens, and the shebang line.
//!
//! After every `new_line` token the machine re-enters the start state and
//! measures the leading whitespace of the next physical line. Spaces and
//! tabs are counted separately; a tab count is offset by
//! `TAB_INDENT_OFFSET` so one integer encodes both the count and the kind.
//! Mixed indentation is diagnosed by the parser, not here.

use super::core::{State, Tokenizer};
use crate::token::{Payload, TokenKind, TAB_INDENT_OFFSET};

impl Tokenizer<'_, '_> {
    /// Handles the start state: emits at most one indentation token for
    /// the line, then falls through to ordinary token scanning.
    pub(super) fn lex_line_start(&mut self) {
        if self.cursor.is_at_end() {
            self.state = State::End;
            return;
        }

        let start = self.cursor.position();
        match self.cursor.byte_at(0) {
            Some(b' ') => {
                let mut count = 0u32;
                while self.cursor.byte_at(0) == Some(b' ') {
                    self.cursor.advance();
                    count += 1;
                }
                self.push_token(TokenKind::Indent, start, Payload::Indent(count));
            }
            Some(b'\t') => {
                let mut count = 0u32;
                while self.cursor.byte_at(0) == Some(b'\t') {
                    self.cursor.advance();
                    count += 1;
                }
                self.push_token(
                    TokenKind::Indent,
                    start,
                    Payload::Indent(count + TAB_INDENT_OFFSET),
                );
            }
            _ => {}
        }
        self.state = State::Token;
    }

    /// Consumes a leading `#!` line, emitting nothing.
    pub(super) fn skip_shebang(&mut self) {
        if self.cursor.position() != 0 {
            return;
        }
        if self.cursor.byte_at(0) == Some(b'#') && self.cursor.byte_at(1) == Some(b'!') {
            while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                self.cursor.advance();
            }
            // Consume the newline as well; the file body starts fresh.
            self.cursor.advance();
        }
    }
}
