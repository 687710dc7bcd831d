//! String literal and template interpolation lexing.
//!
//! Three delimiters: `'`, `"`, and `'''`. A `{` inside a string body emits
//! the prefix as a `template_string` token and switches the machine to the
//! template-expression states; the closing delimiter emits either `string`
//! (no interpolation occurred) or `template_string` (final suffix
//! segment). Escapes are a minimal pass: `\` consumes the next character
//! unconditionally, and un-escaping is deferred to [`crate::unescape_string`].

use super::core::{State, StringDelim, Tokenizer};
use crate::token::{Payload, TokenKind};
use crate::LexError;

impl Tokenizer<'_, '_> {
    /// Enters string scanning at an opening `'`, `"`, or `'''`.
    pub(super) fn begin_string(&mut self) {
        self.string_open = self.cursor.position();
        self.had_template_expr = false;

        if self.cursor.current_char() == '"' {
            self.string_delim = StringDelim::Double;
            self.cursor.advance();
        } else if self.cursor.char_at(1) == '\'' && self.cursor.char_at(2) == '\'' {
            self.string_delim = StringDelim::Triple;
            self.cursor.advance_bytes(3);
        } else {
            self.string_delim = StringDelim::Single;
            self.cursor.advance();
        }

        self.seg_start = self.cursor.position();
        self.state = State::TemplateString;
    }

    /// Scans a string body until the closing delimiter or the next `{`
    /// interpolation.
    pub(super) fn lex_template_string(&mut self) -> Result<(), LexError> {
        loop {
            if self.cursor.is_at_end() {
                return self.unterminated_string();
            }

            let c = self.cursor.current_char();

            if self.at_closing_delim() {
                let end = self.cursor.position();
                let delim_len = match self.string_delim {
                    StringDelim::Triple => 3,
                    _ => 1,
                };
                self.cursor.advance_bytes(delim_len);
                let kind = if self.had_template_expr {
                    TokenKind::TemplateString
                } else {
                    TokenKind::String
                };
                self.push_token(kind, self.seg_start, Payload::End(end as u32));
                self.state = State::Token;
                return Ok(());
            }

            match c {
                '\\' => {
                    // Minimal escape pass: the next character is consumed
                    // unconditionally.
                    self.cursor.advance();
                    self.cursor.advance();
                }
                '\n' if self.string_delim != StringDelim::Triple => {
                    return self.unterminated_string();
                }
                '{' => {
                    let brace = self.cursor.position();
                    self.push_token(
                        TokenKind::TemplateString,
                        self.seg_start,
                        Payload::End(brace as u32),
                    );
                    self.cursor.advance();
                    self.had_template_expr = true;
                    self.state = State::TemplateExpr;
                    return Ok(());
                }
                _ => self.cursor.advance(),
            }
        }
    }

    /// Emits the expression-start marker and enters expression scanning
    /// with a fresh brace-depth counter.
    pub(super) fn begin_template_expr(&mut self) {
        let pos = self.cursor.position();
        self.push_token(TokenKind::TemplateExprStart, pos, Payload::None);
        self.template_brace_depth = 0;
        self.state = State::TemplateExprToken;
    }

    /// Lexes a plain, non-interpolating string inside a template
    /// expression. Nested template strings are not supported; this is the
    /// restricted nested form.
    pub(super) fn lex_plain_string(&mut self) -> Result<(), LexError> {
        let open = self.cursor.position();
        let quote = self.cursor.current_char();
        self.cursor.advance();
        let start = self.cursor.position();

        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                self.fail(
                    LexError::UnterminatedString { pos: open as u32 },
                    open,
                )?;
                return Ok(());
            }
            let c = self.cursor.current_char();
            if c == quote {
                let end = self.cursor.position();
                self.cursor.advance();
                self.push_token(TokenKind::String, start, Payload::End(end as u32));
                return Ok(());
            }
            if c == '\\' {
                self.cursor.advance();
            }
            self.cursor.advance();
        }
    }

    /// Reports an unterminated string at the opening quote. In forgiving
    /// mode, emits an `err` token and resumes ordinary scanning.
    pub(super) fn unterminated_string(&mut self) -> Result<(), LexError> {
        let open = self.string_open;
        self.fail(LexError::UnterminatedString { pos: open as u32 }, open)?;
        self.state = if self.cursor.is_at_end() {
            State::End
        } else {
            State::Token
        };
        Ok(())
    }

    /// Whether the cursor sits on the closing delimiter of the current
    /// string.
    fn at_closing_delim(&self) -> bool {
        match self.string_delim {
            StringDelim::Single => self.cursor.current_char() == '\'',
            StringDelim::Double => self.cursor.current_char() == '"',
            StringDelim::Triple => {
                self.cursor.current_char() == '\''
                    && self.cursor.char_at(1) == '\''
                    && self.cursor.char_at(2) == '\''
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::token::{OperatorKind, TokenKind};
    use crate::tokenizer::{tokenize, TokenizeOptions};
    use crate::LexError;
    use sablec_util::IndexVec;

    fn lex(source: &str) -> Vec<crate::Token> {
        let mut tokens = IndexVec::new();
        tokenize(source, &mut tokens, TokenizeOptions::default()).expect("lex failure");
        tokens.iter().copied().collect()
    }

    fn lex_err(source: &str) -> LexError {
        let mut tokens = IndexVec::new();
        tokenize(source, &mut tokens, TokenizeOptions::default()).unwrap_err()
    }

    #[test]
    fn test_plain_single_quote() {
        let src = "'abc'";
        let toks = lex(src);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind(), TokenKind::String);
        assert_eq!(toks[0].lexeme(src), "abc");
    }

    #[test]
    fn test_plain_double_quote() {
        let src = "\"hi\"";
        let toks = lex(src);
        assert_eq!(toks[0].kind(), TokenKind::String);
        assert_eq!(toks[0].lexeme(src), "hi");
    }

    #[test]
    fn test_triple_quote_spans_newlines() {
        let src = "'''a\nb'''";
        let toks = lex(src);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind(), TokenKind::String);
        assert_eq!(toks[0].lexeme(src), "a\nb");
    }

    #[test]
    fn test_single_line_string_rejects_newline() {
        assert!(matches!(
            lex_err("'abc\n'"),
            LexError::UnterminatedString { pos: 0 }
        ));
        assert!(matches!(
            lex_err("\"abc"),
            LexError::UnterminatedString { pos: 0 }
        ));
    }

    #[test]
    fn test_escape_consumes_next_char() {
        let src = r"'a\'b'";
        let toks = lex(src);
        assert_eq!(toks[0].lexeme(src), r"a\'b");
    }

    #[test]
    fn test_template_interpolation_sequence() {
        let src = "'abc{1+2}def'";
        let toks = lex(src);
        let kinds: Vec<_> = toks.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateString,
                TokenKind::TemplateExprStart,
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::RightBrace,
                TokenKind::TemplateString,
            ]
        );
        assert_eq!(toks[0].lexeme(src), "abc");
        assert_eq!(toks[2].lexeme(src), "1");
        assert_eq!(toks[3].operator(), Some(OperatorKind::Plus));
        assert_eq!(toks[4].lexeme(src), "2");
        assert_eq!(toks[6].lexeme(src), "def");
    }

    #[test]
    fn test_template_empty_segments() {
        let src = "'{x}'";
        let toks = lex(src);
        let kinds: Vec<_> = toks.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateString,
                TokenKind::TemplateExprStart,
                TokenKind::Ident,
                TokenKind::RightBrace,
                TokenKind::TemplateString,
            ]
        );
        assert_eq!(toks[0].lexeme(src), "");
        assert_eq!(toks[4].lexeme(src), "");
    }

    #[test]
    fn test_template_nested_braces() {
        let src = "'v={ {1:2}[1] }'";
        let kinds: Vec<_> = lex(src).iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateString,
                TokenKind::TemplateExprStart,
                TokenKind::LeftBrace,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::Number,
                TokenKind::RightBracket,
                TokenKind::RightBrace,
                TokenKind::TemplateString,
            ]
        );
    }

    #[test]
    fn test_escaped_brace_stays_literal() {
        let src = r"'a\{b'";
        let toks = lex(src);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind(), TokenKind::String);
    }

    #[test]
    fn test_nested_plain_string_in_template_expr() {
        let src = "'a{'b'}c'";
        let kinds: Vec<_> = lex(src).iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateString,
                TokenKind::TemplateExprStart,
                TokenKind::String,
                TokenKind::RightBrace,
                TokenKind::TemplateString,
            ]
        );
    }

    #[test]
    fn test_newline_inside_template_expr_errors() {
        assert!(matches!(
            lex_err("'a{1\n}'"),
            LexError::UnterminatedString { .. }
        ));
    }

    #[test]
    fn test_multiline_template() {
        let src = "'''a{1}\nb'''";
        let kinds: Vec<_> = lex(src).iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateString,
                TokenKind::TemplateExprStart,
                TokenKind::Number,
                TokenKind::RightBrace,
                TokenKind::TemplateString,
            ]
        );
        assert_eq!(lex(src)[4].lexeme(src), "\nb");
    }

    #[test]
    fn test_unterminated_forgiving_mode() {
        let mut tokens = IndexVec::new();
        tokenize(
            "'abc",
            &mut tokens,
            TokenizeOptions {
                ignore_errors: true,
            },
        )
        .expect("forgiving mode");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TokenKind::Err]);
    }
}
