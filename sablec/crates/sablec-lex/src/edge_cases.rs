//! Edge case tests for sablec-lex

use crate::token::{Token, TokenId, TokenKind};
use crate::tokenizer::{tokenize, TokenizeOptions};
use crate::LexError;
use proptest::prelude::*;
use sablec_util::IndexVec;

fn lex_all(source: &str) -> Vec<Token> {
    let mut tokens = IndexVec::new();
    tokenize(source, &mut tokens, TokenizeOptions::default()).expect("lex failure");
    tokens.iter().copied().collect()
}

fn lex_forgiving(source: &str) -> Vec<Token> {
    let mut tokens = IndexVec::new();
    tokenize(
        source,
        &mut tokens,
        TokenizeOptions {
            ignore_errors: true,
        },
    )
    .expect("forgiving lex");
    tokens.iter().copied().collect()
}

// ==================== EDGE CASES ====================

#[test]
fn test_edge_whitespace_only() {
    let toks = lex_all("   ");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind(), TokenKind::Indent);
}

#[test]
fn test_edge_carriage_returns_ignored() {
    let kinds: Vec<_> = lex_all("a\r\nb").iter().map(|t| t.kind()).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Ident, TokenKind::NewLine, TokenKind::Ident]
    );
}

#[test]
fn test_edge_long_identifier() {
    let name = "a".repeat(10_000);
    let toks = lex_all(&name);
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].lexeme(&name), name);
}

#[test]
fn test_edge_every_keyword() {
    let keywords = [
        "and", "as", "break", "capture", "catch", "coinit", "continue", "coresume", "coyield",
        "each", "else", "enum", "error", "false", "for", "func", "if", "import", "is", "match",
        "none", "object", "or", "pass", "some", "static", "not", "return", "then", "throw",
        "true", "try", "type", "var", "while",
    ];
    for kw in keywords {
        let toks = lex_all(kw);
        assert_eq!(toks.len(), 1, "keyword {kw}");
        assert!(toks[0].kind().is_keyword(), "keyword {kw}");
        assert_eq!(toks[0].lexeme(kw), kw, "keyword {kw}");
    }
}

#[test]
fn test_edge_adjacent_strings() {
    let src = "'a''b'";
    let toks = lex_all(src);
    assert_eq!(toks.len(), 2);
    assert_eq!(toks[0].lexeme(src), "a");
    assert_eq!(toks[1].lexeme(src), "b");
}

#[test]
fn test_edge_template_many_segments() {
    let src = "'{1}{2}{3}'";
    let segs = lex_all(src)
        .iter()
        .filter(|t| t.kind() == TokenKind::TemplateString)
        .count();
    assert_eq!(segs, 4);
}

#[test]
fn test_edge_err_token_spans_bad_input() {
    let src = "a ? b";
    let toks = lex_forgiving(src);
    assert_eq!(toks[1].kind(), TokenKind::Err);
    assert_eq!(toks[1].lexeme(src), "?");
}

#[test]
fn test_edge_multiple_err_tokens() {
    let toks = lex_forgiving("? ?");
    let errs = toks.iter().filter(|t| t.kind() == TokenKind::Err).count();
    assert_eq!(errs, 2);
}

#[test]
fn test_edge_error_position_reported() {
    let mut tokens: IndexVec<TokenId, Token> = IndexVec::new();
    let err = tokenize("ab ?", &mut tokens, TokenizeOptions::default()).unwrap_err();
    assert_eq!(err.pos(), 3);
}

#[test]
fn test_edge_shebang_only() {
    assert!(lex_all("#!/bin/sable").is_empty());
}

#[test]
fn test_edge_comment_at_eof() {
    assert!(lex_all("-- only a comment").is_empty());
}

#[test]
fn test_edge_retained_buffer_reuse() {
    let mut tokens: IndexVec<TokenId, Token> = IndexVec::new();
    tokenize("1 + 2", &mut tokens, TokenizeOptions::default()).expect("lex");
    let first: Vec<_> = tokens.iter().copied().collect();

    tokens.clear();
    tokenize("1 + 2", &mut tokens, TokenizeOptions::default()).expect("lex");
    let second: Vec<_> = tokens.iter().copied().collect();
    assert_eq!(first, second);
}

#[test]
fn test_edge_unterminated_template_expr() {
    let err = {
        let mut tokens: IndexVec<TokenId, Token> = IndexVec::new();
        tokenize("'a{1+", &mut tokens, TokenizeOptions::default()).unwrap_err()
    };
    assert!(matches!(err, LexError::UnterminatedString { pos: 0 }));
}

// ==================== PROPERTIES ====================

proptest! {
    /// Every variable-length token round-trips through its recorded
    /// offsets.
    #[test]
    fn prop_lexeme_roundtrip(words in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 1..8)) {
        let src = words.join(" ");
        for tok in lex_all(&src) {
            let lexeme = tok.lexeme(&src);
            prop_assert_eq!(lexeme, &src[tok.start() as usize..tok.end() as usize]);
            prop_assert!(!lexeme.is_empty());
        }
    }

    /// Number lexemes reproduce their source text exactly.
    #[test]
    fn prop_number_roundtrip(n in 0u64..=u64::MAX / 2, frac in 0u32..1000) {
        let src = format!("{n} {n}.{frac:03}");
        let toks = lex_all(&src);
        prop_assert_eq!(toks.len(), 2);
        prop_assert_eq!(toks[0].lexeme(&src), format!("{n}"));
        prop_assert_eq!(toks[1].lexeme(&src), format!("{n}.{frac:03}"));
    }

    /// Re-lexing the same source yields an identical token array.
    #[test]
    fn prop_deterministic(src in "[a-z0-9 +*().\n]{0,40}") {
        let mut a: IndexVec<TokenId, Token> = IndexVec::new();
        let mut b: IndexVec<TokenId, Token> = IndexVec::new();
        let ra = tokenize(&src, &mut a, TokenizeOptions::default());
        let rb = tokenize(&src, &mut b, TokenizeOptions::default());
        prop_assert_eq!(ra.is_ok(), rb.is_ok());
        let va: Vec<_> = a.iter().copied().collect();
        let vb: Vec<_> = b.iter().copied().collect();
        prop_assert_eq!(va, vb);
    }
}
