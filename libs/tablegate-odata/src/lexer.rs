//! Tokenizer for `$filter` expressions.
//!
//! Every token carries the byte offset it starts at so parse errors can point
//! at the offending input.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Identifier or keyword (`and`, `eq`, `contains`, field names, ...).
    Ident(String),
    /// Single-quoted string literal, quote escaping already resolved.
    Str(String),
    Number(BigDecimal),
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// Human-readable form for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Str(_) => "string literal".to_owned(),
            Token::Number(_) => "numeric literal".to_owned(),
            Token::LParen => "'('".to_owned(),
            Token::RParen => "')'".to_owned(),
            Token::Comma => "','".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub pos: usize,
}

/// Tokenize a raw `$filter` string.
///
/// # Errors
/// Returns [`Error::FilterSyntax`] for unterminated strings, malformed
/// numbers, or characters outside the grammar.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, Error> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
            }
            b'(' => {
                tokens.push(SpannedToken {
                    token: Token::LParen,
                    pos: start,
                });
                pos += 1;
            }
            b')' => {
                tokens.push(SpannedToken {
                    token: Token::RParen,
                    pos: start,
                });
                pos += 1;
            }
            b',' => {
                tokens.push(SpannedToken {
                    token: Token::Comma,
                    pos: start,
                });
                pos += 1;
            }
            b'\'' => {
                let (s, next) = scan_string(input, start)?;
                tokens.push(SpannedToken {
                    token: Token::Str(s),
                    pos: start,
                });
                pos = next;
            }
            b'0'..=b'9' => {
                let (n, next) = scan_number(input, start)?;
                tokens.push(SpannedToken {
                    token: Token::Number(n),
                    pos: start,
                });
                pos = next;
            }
            b'-' if pos + 1 < bytes.len() && bytes[pos + 1].is_ascii_digit() => {
                let (n, next) = scan_number(input, start)?;
                tokens.push(SpannedToken {
                    token: Token::Number(n),
                    pos: start,
                });
                pos = next;
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let mut end = pos + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                tokens.push(SpannedToken {
                    token: Token::Ident(input[start..end].to_owned()),
                    pos: start,
                });
                pos = end;
            }
            _ => {
                // pos is always on a char boundary here
                let ch = input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(Error::syntax(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Scan a single-quoted string starting at `start`. A doubled quote inside the
/// literal denotes a single quote character.
fn scan_string(input: &str, start: usize) -> Result<(String, usize), Error> {
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut pos = start + 1;

    while pos < bytes.len() {
        if bytes[pos] == b'\'' {
            if pos + 1 < bytes.len() && bytes[pos + 1] == b'\'' {
                out.push('\'');
                pos += 2;
            } else {
                return Ok((out, pos + 1));
            }
        } else {
            // Copy a whole UTF-8 scalar, not a byte
            let ch = input[pos..]
                .chars()
                .next()
                .ok_or_else(|| Error::syntax(pos, "invalid UTF-8 in string literal"))?;
            out.push(ch);
            pos += ch.len_utf8();
        }
    }

    Err(Error::syntax(start, "unterminated string literal"))
}

fn scan_number(input: &str, start: usize) -> Result<(BigDecimal, usize), Error> {
    let bytes = input.as_bytes();
    let mut pos = start;
    if bytes[pos] == b'-' {
        pos += 1;
    }
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == frac_start {
            return Err(Error::syntax(start, "malformed numeric literal"));
        }
    }
    let text = &input[start..pos];
    let value = BigDecimal::from_str(text)
        .map_err(|_| Error::syntax(start, format!("malformed numeric literal '{text}'")))?;
    Ok((value, pos))
}
