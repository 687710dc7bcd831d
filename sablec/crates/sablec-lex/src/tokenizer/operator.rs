//! Operator lexing and `--` comments.
//!
//! Multi-character operators are matched greedily: `==`, `=>`, `!=`, `<=`,
//! `<<`, `>=`, `>>`, `||`.

use super::core::Tokenizer;
use crate::token::{OperatorKind, Payload, TokenKind};

impl Tokenizer<'_, '_> {
    /// Emits an operator token.
    fn push_operator(&mut self, start: usize, op: OperatorKind) {
        self.push_token(TokenKind::Operator, start, Payload::Operator(op));
    }

    /// Lexes one of the single-character operators `+ * / % ^ ~ &`.
    pub(super) fn lex_simple_operator(&mut self) {
        let start = self.cursor.position();
        let op = match self.cursor.current_char() {
            '+' => OperatorKind::Plus,
            '*' => OperatorKind::Star,
            '/' => OperatorKind::Slash,
            '%' => OperatorKind::Percent,
            '^' => OperatorKind::Caret,
            '~' => OperatorKind::Tilde,
            '&' => OperatorKind::Ampersand,
            c => unreachable!("not a simple operator: {c}"),
        };
        self.cursor.advance();
        self.push_operator(start, op);
    }

    /// Lexes `-`, or consumes a `--` comment up to (but not including) the
    /// newline without emitting a token.
    pub(super) fn lex_minus(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.current_char() == '-' {
            while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                self.cursor.advance();
            }
            return;
        }
        self.push_operator(start, OperatorKind::Minus);
    }

    /// Lexes `=`, `==`, or `=>`.
    pub(super) fn lex_equal(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.push_operator(start, OperatorKind::EqualEqual);
        } else if self.cursor.match_char('>') {
            self.push_token(TokenKind::EqualGreater, start, Payload::None);
        } else {
            self.push_token(TokenKind::Equal, start, Payload::None);
        }
    }

    /// Lexes `!` or `!=`.
    pub(super) fn lex_bang(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.push_operator(start, OperatorKind::BangEqual);
        } else {
            self.push_operator(start, OperatorKind::Bang);
        }
    }

    /// Lexes `|` or `||`.
    pub(super) fn lex_vertical_bar(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.match_char('|') {
            self.push_operator(start, OperatorKind::DoubleVerticalBar);
        } else {
            self.push_operator(start, OperatorKind::VerticalBar);
        }
    }

    /// Lexes `<`, `<=`, or `<<`.
    pub(super) fn lex_less(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.push_operator(start, OperatorKind::LessEqual);
        } else if self.cursor.match_char('<') {
            self.push_operator(start, OperatorKind::LessLess);
        } else {
            self.push_operator(start, OperatorKind::Less);
        }
    }

    /// Lexes `>`, `>=`, or `>>`.
    pub(super) fn lex_greater(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.push_operator(start, OperatorKind::GreaterEqual);
        } else if self.cursor.match_char('>') {
            self.push_operator(start, OperatorKind::GreaterGreater);
        } else {
            self.push_operator(start, OperatorKind::Greater);
        }
    }
}
