//! Lexical scanner for grammar specification files
//!
//! Produces the token kinds the meta-grammar is written over: names,
//! strings (plain and raw), single-character operators, logical newlines,
//! and three kinds of balanced-delimiter regions captured as opaque text —
//! `{ … }` action expressions, `[ … ]` lists, and `( … )` tuples. Regions
//! may nest and may span lines; their inner text is handed to the action
//! compiler or the terminal registry untouched.
//!
//! Comments run from `#` to end of line. Blank lines produce nothing; a
//! line that produced tokens is terminated by a `Newline` token, and the
//! whole stream by an `EndMarker`.

use crate::error::TokenError;

/// The kind of a specification token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecTokenKind {
    /// An identifier
    Name,
    /// A string literal (see [`SpecToken::raw`])
    Str,
    /// A run of digits
    Number,
    /// A single-character operator
    Op,
    /// End of a logical line
    Newline,
    /// A braced region: an action expression
    Expr,
    /// A bracketed region
    List,
    /// A parenthesized region: terminal-constructor arguments
    Tuple,
    /// End of the stream
    EndMarker,
}

/// One lexical token of a grammar specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecToken {
    /// What kind of token this is
    pub kind: SpecTokenKind,
    /// The token text: decoded content for strings, inner text for
    /// regions, the lexeme otherwise
    pub value: String,
    /// For strings: whether the literal was `r"…"`-prefixed
    pub raw: bool,
    /// 1-based source line
    pub line: usize,
}

impl SpecToken {
    fn new(kind: SpecTokenKind, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            raw: false,
            line,
        }
    }
}

fn err(line: usize, col: usize, message: impl Into<String>) -> TokenError {
    TokenError {
        line,
        col,
        message: message.into(),
    }
}

/// Tokenize a grammar specification
pub fn tokenize(src: &str) -> Result<Vec<SpecToken>, TokenError> {
    let bytes = src.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0;
    let mut line = 1;
    let mut line_start = 0;
    let mut line_had_tokens = false;

    while i < bytes.len() {
        let b = bytes[i];
        let col = i - line_start + 1;
        match b {
            b'\n' => {
                if line_had_tokens {
                    toks.push(SpecToken::new(SpecTokenKind::Newline, "\n", line));
                }
                line += 1;
                i += 1;
                line_start = i;
                line_had_tokens = false;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'#' => {
                // Comment to end of line.
                match memchr::memchr(b'\n', &bytes[i..]) {
                    Some(off) => i += off,
                    None => i = bytes.len(),
                }
            }
            b'"' | b'\'' => {
                let (value, next) = scan_string(src, i, false, line)?;
                toks.push(SpecToken::new(SpecTokenKind::Str, value, line));
                line_had_tokens = true;
                i = next;
            }
            b'(' | b'[' | b'{' => {
                let (kind, inner, next) = scan_region(src, i, line)?;
                line += count_newlines(&src[i..next]);
                line_start = i; // close enough after a multi-line region
                toks.push(SpecToken::new(kind, inner, line));
                line_had_tokens = true;
                i = next;
            }
            b')' | b']' | b'}' => {
                return Err(err(line, col, "improperly nested delimiters"));
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                toks.push(SpecToken::new(
                    SpecTokenKind::Number,
                    &src[start..i],
                    line,
                ));
                line_had_tokens = true;
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let name = &src[start..i];
                // A raw-string prefix immediately followed by a quote.
                let is_raw_prefix = matches!(name, "r" | "R" | "ur" | "uR" | "Ur" | "UR" | "u");
                if is_raw_prefix && i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                    let raw = name.to_ascii_lowercase().contains('r');
                    let (value, next) = scan_string(src, i, raw, line)?;
                    let mut tok = SpecToken::new(SpecTokenKind::Str, value, line);
                    tok.raw = raw;
                    toks.push(tok);
                    i = next;
                } else {
                    toks.push(SpecToken::new(SpecTokenKind::Name, name, line));
                }
                line_had_tokens = true;
            }
            _ if b < 0x80 => {
                toks.push(SpecToken::new(
                    SpecTokenKind::Op,
                    &src[i..i + 1],
                    line,
                ));
                line_had_tokens = true;
                i += 1;
            }
            _ => {
                return Err(err(line, col, "unexpected byte outside a string"));
            }
        }
    }

    if line_had_tokens {
        toks.push(SpecToken::new(SpecTokenKind::Newline, "\n", line));
    }
    toks.push(SpecToken::new(SpecTokenKind::EndMarker, "", line));
    Ok(toks)
}

fn count_newlines(s: &str) -> usize {
    memchr::memchr_iter(b'\n', s.as_bytes()).count()
}

/// Scan a quoted string starting at `i`; returns (decoded value, index
/// after the closing quote)
fn scan_string(
    src: &str,
    i: usize,
    raw: bool,
    line: usize,
) -> Result<(String, usize), TokenError> {
    let bytes = src.as_bytes();
    let quote = bytes[i];
    let mut out = Vec::new();
    let mut j = i + 1;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b'\\' && j + 1 < bytes.len() {
            let next = bytes[j + 1];
            if raw {
                // Raw strings keep the backslash, but it still guards a
                // quote from closing the literal.
                out.push(b);
                out.push(next);
            } else {
                match next {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'\\' => out.push(b'\\'),
                    b'\'' => out.push(b'\''),
                    b'"' => out.push(b'"'),
                    other => {
                        out.push(b'\\');
                        out.push(other);
                    }
                }
            }
            j += 2;
            continue;
        }
        if b == quote {
            let value = String::from_utf8(out)
                .map_err(|_| err(line, 1, "string literal is not valid UTF-8"))?;
            return Ok((value, j + 1));
        }
        if b == b'\n' {
            return Err(err(line, j - i, "unterminated string literal"));
        }
        out.push(b);
        j += 1;
    }
    Err(err(line, j - i, "unterminated string literal"))
}

/// Scan a balanced region starting at an open delimiter; returns the
/// region kind, the inner text, and the index after the close delimiter
fn scan_region(
    src: &str,
    i: usize,
    line: usize,
) -> Result<(SpecTokenKind, String, usize), TokenError> {
    let bytes = src.as_bytes();
    let (kind, close) = match bytes[i] {
        b'(' => (SpecTokenKind::Tuple, b')'),
        b'[' => (SpecTokenKind::List, b']'),
        b'{' => (SpecTokenKind::Expr, b'}'),
        _ => return Err(err(line, 1, "not a region delimiter")),
    };
    let mut stack = vec![close];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'"' | b'\'' => {
                let (_, next) = scan_string(src, j, true, line)?;
                j = next;
                continue;
            }
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            b')' | b']' | b'}' => {
                let expected = stack.pop();
                if expected != Some(bytes[j]) {
                    return Err(err(line, j - i, "improperly nested delimiters"));
                }
                if stack.is_empty() {
                    let inner = src[i + 1..j].to_string();
                    return Ok((kind, inner, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }
    Err(err(line, 1, "unbalanced delimiters at end of input"))
}
