//! Core tokenizer implementation.
//!
//! This module contains the Tokenizer struct, the tokenize state machine,
//! and the per-character dispatch for the ordinary token state.

use sablec_util::IndexVec;

use crate::cursor::Cursor;
use crate::token::{Payload, Token, TokenId, TokenKind};
use crate::LexError;

/// Options controlling a tokenize run.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenizeOptions {
    /// When true, unrecognized input produces an `err` token and scanning
    /// continues instead of aborting at the first lexical error.
    pub ignore_errors: bool,
}

/// Tokenize `source`, appending into `tokens`.
///
/// The output buffer is caller-owned so it can be retained and reused
/// across runs.
pub fn tokenize(
    source: &str,
    tokens: &mut IndexVec<TokenId, Token>,
    options: TokenizeOptions,
) -> Result<(), LexError> {
    Tokenizer::new(source, tokens, options).run()
}

/// Tokenizer state machine states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum State {
    /// At the start of a physical line; may emit an indentation token.
    Start,
    /// Ordinary token scanning.
    Token,
    /// Inside a string or template string body.
    TemplateString,
    /// A `{` was seen inside a string; emit the expression-start marker.
    TemplateExpr,
    /// Scanning tokens of an embedded template expression.
    TemplateExprToken,
    /// Input exhausted.
    End,
}

/// String delimiter in effect while scanning a string body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StringDelim {
    /// `'...'`
    Single,
    /// `"..."`
    Double,
    /// `'''...'''`, may span newlines.
    Triple,
}

/// Tokenizer for sable source code.
///
/// Consumes a byte buffer and appends tokens plus indentation markers to a
/// caller-owned buffer. Scanning runs to the end of input or to the first
/// lexical error.
pub struct Tokenizer<'src, 'out> {
    /// Character cursor over the source.
    pub(super) cursor: Cursor<'src>,

    /// Output token buffer.
    tokens: &'out mut IndexVec<TokenId, Token>,

    /// Current machine state.
    pub(super) state: State,

    /// Delimiter of the string currently being scanned.
    pub(super) string_delim: StringDelim,

    /// Byte position of the opening quote, for error reporting.
    pub(super) string_open: usize,

    /// Start of the current string segment (after the opening quote or the
    /// closing `}` of an interpolation).
    pub(super) seg_start: usize,

    /// Whether the current string has produced at least one interpolation.
    pub(super) had_template_expr: bool,

    /// `{`/`}` nesting inside the current template expression.
    pub(super) template_brace_depth: u32,

    /// Emit `err` tokens instead of failing.
    ignore_errors: bool,
}

impl<'src, 'out> Tokenizer<'src, 'out> {
    /// Creates a tokenizer over `source` appending into `tokens`.
    pub fn new(
        source: &'src str,
        tokens: &'out mut IndexVec<TokenId, Token>,
        options: TokenizeOptions,
    ) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens,
            state: State::Start,
            string_delim: StringDelim::Single,
            string_open: 0,
            seg_start: 0,
            had_template_expr: false,
            template_brace_depth: 0,
            ignore_errors: options.ignore_errors,
        }
    }

    /// Runs the state machine to completion or to the first lexical error.
    pub fn run(mut self) -> Result<(), LexError> {
        self.skip_shebang();
        while self.state != State::End {
            match self.state {
                State::Start => self.lex_line_start(),
                State::Token => self.lex_one(false)?,
                State::TemplateString => self.lex_template_string()?,
                State::TemplateExpr => self.begin_template_expr(),
                State::TemplateExprToken => self.lex_one(true)?,
                State::End => {}
            }
        }
        Ok(())
    }

    /// Appends a token.
    pub(super) fn push_token(&mut self, kind: TokenKind, start: usize, payload: Payload) {
        self.tokens.push(Token::new(kind, start as u32, payload));
    }

    /// Either fails with `err` or, in forgiving mode, emits an `err` token
    /// covering `start` to the current position and continues.
    pub(super) fn fail(&mut self, err: LexError, start: usize) -> Result<(), LexError> {
        if self.ignore_errors {
            let end = self.cursor.position();
            self.push_token(TokenKind::Err, start, Payload::End(end as u32));
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Scans one lexeme in the token state, or in the template-expression
    /// token state when `in_template_expr` is set.
    ///
    /// Emits at most one token per call; comments and inter-token
    /// whitespace emit nothing.
    fn lex_one(&mut self, in_template_expr: bool) -> Result<(), LexError> {
        // Spaces, tabs, and carriage returns between tokens are consumed
        // silently.
        while matches!(self.cursor.byte_at(0), Some(b' ') | Some(b'\t') | Some(b'\r')) {
            self.cursor.advance();
        }

        let start = self.cursor.position();

        if self.cursor.is_at_end() {
            if in_template_expr {
                return self.unterminated_string();
            }
            self.state = State::End;
            return Ok(());
        }

        let c = self.cursor.current_char();
        match c {
            '\n' => {
                if in_template_expr {
                    // Template expressions must close on the same line.
                    return self.unterminated_string();
                }
                self.cursor.advance();
                self.push_token(TokenKind::NewLine, start, Payload::None);
                self.state = State::Start;
            }
            '{' => {
                self.cursor.advance();
                if in_template_expr {
                    self.template_brace_depth += 1;
                }
                self.push_token(TokenKind::LeftBrace, start, Payload::None);
            }
            '}' => {
                self.cursor.advance();
                self.push_token(TokenKind::RightBrace, start, Payload::None);
                if in_template_expr {
                    if self.template_brace_depth == 0 {
                        // Interpolation closed; resume the string body.
                        self.seg_start = self.cursor.position();
                        self.state = State::TemplateString;
                    } else {
                        self.template_brace_depth -= 1;
                    }
                }
            }
            '\'' | '"' => {
                if in_template_expr {
                    // Nested strings inside a template expression are
                    // restricted to the plain, non-interpolating form.
                    self.lex_plain_string()?;
                } else {
                    self.begin_string();
                }
            }
            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            '@' => self.single(TokenKind::At),
            '.' => {
                self.cursor.advance();
                if self.cursor.match_char('.') {
                    self.push_token(TokenKind::DotDot, start, Payload::None);
                } else {
                    self.push_token(TokenKind::Dot, start, Payload::None);
                }
            }
            '=' => self.lex_equal(),
            '+' | '*' | '/' | '%' | '^' | '~' | '&' => self.lex_simple_operator(),
            '-' => self.lex_minus(),
            '|' => self.lex_vertical_bar(),
            '!' => self.lex_bang(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '#' => self.lex_symbol()?,
            c if c.is_ascii_alphabetic() => self.lex_identifier(),
            c if c.is_ascii_digit() => self.lex_number()?,
            c => {
                self.cursor.advance();
                self.fail(
                    LexError::UnrecognizedChar {
                        ch: c,
                        pos: start as u32,
                    },
                    start,
                )?;
            }
        }
        Ok(())
    }

    /// Emits a single-character token.
    fn single(&mut self, kind: TokenKind) {
        let start = self.cursor.position();
        self.cursor.advance();
        self.push_token(kind, start, Payload::None);
    }
}
