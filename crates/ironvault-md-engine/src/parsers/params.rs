//! # Parameter tokenizer
//!
//! Parses free-order `key=value` parameter lists such as
//! `name="[[Clocks\/Doom.md|Doom]]" from=2 to=3 out-of=6`.
//!
//! Grammar:
//!
//! ```text
//! params := ws* pair (ws+ pair)* ws*
//! pair   := key '=' value
//! key    := [A-Za-z0-9_-]+
//! value  := '"' [^"]* '"' | '-'? [0-9]+ | 'true' | 'false'
//! ```
//!
//! Anything outside the grammar rejects the whole line, so a parser built on
//! parameters falls back to its raw output instead of guessing.

use thiserror::Error;

use super::args::{Args, Value};
use super::cursor::Cursor;

/// Reserved argument key holding parameters a parser did not declare.
pub const EXTRA_KEY: &str = "extra";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("no parameters")]
    Empty,
    #[error("expected a parameter name at byte {0}")]
    ExpectedKey(usize),
    #[error("expected '=' after `{key}` at byte {pos}")]
    ExpectedEquals { key: String, pos: usize },
    #[error("invalid value for `{key}` at byte {pos}")]
    InvalidValue { key: String, pos: usize },
    #[error("unterminated string value for `{key}`")]
    UnterminatedString { key: String },
    #[error("expected whitespace before byte {0}")]
    ExpectedSeparator(usize),
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn at_boundary(cur: &Cursor<'_>) -> bool {
    cur.peek().is_none_or(|b| b.is_ascii_whitespace())
}

/// Tokenizes a parameter list into `(key, value)` pairs in input order.
pub fn parse_params(input: &str) -> Result<Vec<(String, Value)>, ParamError> {
    let mut cur = Cursor::new(input);
    let mut pairs = Vec::new();

    cur.skip_whitespace();
    while !cur.eof() {
        if !pairs.is_empty() && cur.skip_whitespace() == 0 && !cur.eof() {
            return Err(ParamError::ExpectedSeparator(cur.i));
        }
        if cur.eof() {
            break;
        }
        pairs.push(parse_pair(&mut cur)?);
    }

    if pairs.is_empty() {
        return Err(ParamError::Empty);
    }
    Ok(pairs)
}

fn parse_pair(cur: &mut Cursor<'_>) -> Result<(String, Value), ParamError> {
    let start = cur.i;
    let key = cur.take_while(is_key_byte).to_string();
    if key.is_empty() {
        return Err(ParamError::ExpectedKey(start));
    }

    if cur.bump() != Some(b'=') {
        return Err(ParamError::ExpectedEquals { key, pos: cur.i });
    }

    let pos = cur.i;
    let value = match cur.peek() {
        Some(b'"') => {
            cur.bump();
            let text = cur.take_while(|b| b != b'"');
            if cur.bump() != Some(b'"') {
                return Err(ParamError::UnterminatedString { key });
            }
            Value::Str(text.to_string())
        }
        Some(b'-' | b'0'..=b'9') => {
            let negative = cur.peek() == Some(b'-');
            if negative {
                cur.bump();
            }
            let digits = cur.take_while(|b| b.is_ascii_digit());
            let n: i64 = digits
                .parse()
                .map_err(|_| ParamError::InvalidValue { key: key.clone(), pos })?;
            Value::Int(if negative { -n } else { n })
        }
        _ if cur.starts_with(b"true") => {
            cur.bump_n(4);
            Value::Bool(true)
        }
        _ if cur.starts_with(b"false") => {
            cur.bump_n(5);
            Value::Bool(false)
        }
        _ => return Err(ParamError::InvalidValue { key, pos }),
    };

    if !at_boundary(cur) {
        return Err(ParamError::InvalidValue { key, pos });
    }
    Ok((key, value))
}

/// Splits pairs into declared keys and an `extra` map of everything else.
///
/// The `extra` entry is always present. Repeated keys keep the last value.
pub fn split_known<S: AsRef<str>>(pairs: Vec<(String, Value)>, known: &[S]) -> Args {
    let mut args = Args::new();
    let mut extra = Args::new();

    for (key, value) in pairs {
        if known.iter().any(|k| k.as_ref() == key) {
            args.insert(key, value);
        } else {
            extra.insert(key, value);
        }
    }

    args.insert(EXTRA_KEY.to_string(), Value::Map(extra));
    args
}
