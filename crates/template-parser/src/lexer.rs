//! Expression lexing: quote-aware splitting and literal parsing.
//!
//! Two modes share the grammar. **Fast** (the default) splits on
//! delimiters without escape handling inside quoted literals; **Safe**
//! honours `\n`, `\t`, `\"`, `\\` (and the single-quote analogue). The
//! two modes only diverge for inputs containing escape sequences.

use std::sync::atomic::{AtomicU8, Ordering};

use tree_types::Value;

use crate::error::ExprParseError;

/// Process-wide lexing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// No escape handling inside quoted literals.
    Fast,
    /// Backslash escapes are honoured inside quoted literals.
    Safe,
}

static LEX_MODE: AtomicU8 = AtomicU8::new(0);

/// Returns the current process-wide lexing mode.
pub fn lex_mode() -> LexMode {
    match LEX_MODE.load(Ordering::Relaxed) {
        0 => LexMode::Fast,
        _ => LexMode::Safe,
    }
}

/// Switches the process-wide lexing mode.
///
/// Also clears the expression cache: cached IRs compiled under the other
/// mode would otherwise survive the switch.
pub fn set_lex_mode(mode: LexMode) {
    LEX_MODE.store(mode as u8, Ordering::Relaxed);
    crate::parser::ExpressionParser::clear_cache();
}

/// A piece produced by [`split_outside_quotes`]: byte offset + text.
pub(crate) type Piece<'a> = (usize, &'a str);

/// Splits `input` on `delimiter`, ignoring occurrences inside quoted
/// strings. Offsets are relative to `input` plus `base_offset`.
pub(crate) fn split_outside_quotes<'a>(
    input: &'a str,
    base_offset: usize,
    delimiter: &str,
    mode: LexMode,
) -> Vec<Piece<'a>> {
    let bytes = input.as_bytes();
    let delim = delimiter.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if mode == LexMode::Safe && b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                    i += 1;
                } else if bytes[i..].starts_with(delim) {
                    pieces.push((base_offset + start, &input[start..i]));
                    i += delim.len();
                    start = i;
                } else {
                    i += 1;
                }
            }
        }
    }

    pieces.push((base_offset + start, &input[start..]));
    pieces
}

/// Finds the first top-level (outside quotes) occurrence of `needle`.
pub(crate) fn find_outside_quotes(input: &str, needle: &str, mode: LexMode) -> Option<usize> {
    let bytes = input.as_bytes();
    let target = needle.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if mode == LexMode::Safe && b == b'\\' {
                    i += 2;
                    continue;
                }
                if b == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                    i += 1;
                } else if bytes[i..].starts_with(target) {
                    return Some(i);
                } else {
                    i += 1;
                }
            }
        }
    }

    None
}

/// Parses one literal: quoted string, number, `true`, `false`, `null`.
///
/// Unquoted words that are not numbers or keywords are accepted as bare
/// strings (`default:unknown` reads as `default:"unknown"`).
pub(crate) fn parse_literal(
    text: &str,
    offset: usize,
    mode: LexMode,
) -> Result<Value, ExprParseError> {
    let trimmed = text.trim();
    let offset = offset + leading_ws(text);

    if trimmed.is_empty() {
        return Err(ExprParseError::BadLiteral {
            offset,
            message: "empty literal".to_string(),
        });
    }

    let first = trimmed.as_bytes()[0];
    if first == b'"' || first == b'\'' {
        return parse_quoted(trimmed, offset, mode);
    }

    match trimmed {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }

    if first.is_ascii_digit() || first == b'-' || first == b'+' {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Ok(Value::Int(int));
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            return Ok(Value::Float(float));
        }
        return Err(ExprParseError::BadLiteral {
            offset,
            message: format!("malformed number '{trimmed}'"),
        });
    }

    // Bare word — treated as a string.
    Ok(Value::String(trimmed.to_string()))
}

fn parse_quoted(trimmed: &str, offset: usize, mode: LexMode) -> Result<Value, ExprParseError> {
    let bytes = trimmed.as_bytes();
    let quote = bytes[0];

    let terminated = trimmed.len() >= 2 && bytes[trimmed.len() - 1] == quote && {
        // In safe mode the closing quote must not itself be escaped.
        mode == LexMode::Fast || !is_escaped(bytes, trimmed.len() - 1)
    };
    if !terminated {
        return Err(ExprParseError::BadLiteral {
            offset,
            message: "unterminated string".to_string(),
        });
    }

    let inner = &trimmed[1..trimmed.len() - 1];
    let content = match mode {
        LexMode::Fast => inner.to_string(),
        LexMode::Safe => unescape(inner),
    };
    Ok(Value::String(content))
}

/// True if the byte at `pos` is preceded by an odd number of backslashes.
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let mut backslashes = 0;
    let mut i = pos;
    while i > 0 && bytes[i - 1] == b'\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

/// Resolves `\n`, `\t`, `\"`, `\'`, `\\`; unknown escapes stay verbatim.
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn leading_ws(text: &str) -> usize {
    text.len() - text.trim_start().len()
}
