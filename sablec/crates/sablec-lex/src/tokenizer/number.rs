//! Number and rune literal lexing.
//!
//! Decimal numbers emit `number`; hex/octal/binary integers and rune
//! literals emit `non_decimal_int`. The token records the full lexeme
//! range; numeric conversion happens downstream.

use super::core::Tokenizer;
use crate::token::{Payload, TokenKind};
use crate::LexError;

impl Tokenizer<'_, '_> {
    /// Lexes a number literal starting at the current digit.
    ///
    /// Handles:
    /// - Decimal: `42`, `3.14`, `1e10`, `2.5e-3`
    /// - Hex/octal/binary: `0xFF`, `0o777`, `0b1010`
    /// - Rune: `0u'a'`, `0u'\''`
    ///
    /// A single `.` not followed by a digit is left for the range
    /// operator.
    pub(super) fn lex_number(&mut self) -> Result<(), LexError> {
        let start = self.cursor.position();

        if self.cursor.current_char() == '0' {
            match self.cursor.char_at(1) {
                'x' => return self.lex_radix_int(start, 2, |c| c.is_ascii_hexdigit()),
                'o' => return self.lex_radix_int(start, 2, |c| ('0'..='7').contains(&c)),
                'b' => return self.lex_radix_int(start, 2, |c| c == '0' || c == '1'),
                'u' => {
                    if self.cursor.char_at(2) == '\'' {
                        return self.lex_rune(start);
                    }
                }
                _ => {}
            }
        }

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        // A fraction only begins when a digit follows the dot, which keeps
        // `1..2` lexing as number, `..`, number.
        if self.cursor.current_char() == '.' && self.cursor.char_at(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        if self.cursor.current_char() == 'e' {
            self.cursor.advance();
            if self.cursor.current_char() == '-' {
                self.cursor.advance();
            }
            let digits_start = self.cursor.position();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
            if self.cursor.position() == digits_start {
                return self.fail(
                    LexError::BadNumber {
                        msg: "missing digits in number exponent",
                        pos: start as u32,
                    },
                    start,
                );
            }
        }

        let end = self.cursor.position();
        self.push_token(TokenKind::Number, start, Payload::End(end as u32));
        Ok(())
    }

    /// Lexes the digits of a `0x`/`0o`/`0b` integer after its prefix.
    fn lex_radix_int(
        &mut self,
        start: usize,
        prefix_len: usize,
        is_digit: fn(char) -> bool,
    ) -> Result<(), LexError> {
        self.cursor.advance_bytes(prefix_len);

        let digits_start = self.cursor.position();
        while is_digit(self.cursor.current_char()) {
            self.cursor.advance();
        }

        if self.cursor.position() == digits_start {
            return self.fail(
                LexError::BadNumber {
                    msg: "missing digits after number base prefix",
                    pos: start as u32,
                },
                start,
            );
        }

        let end = self.cursor.position();
        self.push_token(TokenKind::NonDecimalInt, start, Payload::End(end as u32));
        Ok(())
    }

    /// Lexes a `0u'…'` rune literal. A `\` consumes the following
    /// character unconditionally.
    fn lex_rune(&mut self, start: usize) -> Result<(), LexError> {
        // Past `0u'`.
        self.cursor.advance_bytes(3);

        loop {
            if self.cursor.is_at_end() {
                return self.fail(
                    LexError::BadRune {
                        msg: "unterminated rune literal",
                        pos: start as u32,
                    },
                    start,
                );
            }
            match self.cursor.current_char() {
                '\'' => {
                    self.cursor.advance();
                    break;
                }
                '\\' => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                _ => self.cursor.advance(),
            }
        }

        let end = self.cursor.position();
        self.push_token(TokenKind::NonDecimalInt, start, Payload::End(end as u32));
        Ok(())
    }
}
