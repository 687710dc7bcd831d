//! Deferred un-escaping of string lexemes.
//!
//! The tokenizer's escape handling is a minimal pass: `\` consumes the
//! next character so delimiters and braces can be embedded, but the bytes
//! are stored verbatim. Callers that need the actual string value resolve
//! the escapes here.

use std::borrow::Cow;

/// Resolves escape sequences in a raw string lexeme.
///
/// Recognized escapes are `\n`, `\t`, `\r`, `\0`, `\\`, `\'`, `\"`, `\{`,
/// and `\}`. An unrecognized escape passes the following character through
/// unchanged. Returns a borrowed slice when the lexeme contains no
/// escapes.
pub fn unescape_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            // Trailing backslash; keep it.
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}
