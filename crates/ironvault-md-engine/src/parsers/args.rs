use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Argument map handed to a template.
pub type Args = BTreeMap<String, Value>;

/// Named captures of one matched line, before a parser shapes them into [`Args`].
pub type ParsedLine = Args;

/// A single argument value.
///
/// Serializes untagged so templates see plain numbers, strings and lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Args),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of the value. Digit-only strings are parsed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Args> for Value {
    fn from(map: Args) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::List(vec![a.into(), b.into()])
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Builds an [`Args`] map from `key => value` pairs.
///
/// ```
/// use ironvault_md_engine::{args, Value};
///
/// let args = args! { "add" => 2, "reason" => Value::Null };
/// assert_eq!(args["add"], Value::Int(2));
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::parsers::Args::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::parsers::Args::new();
        $( map.insert(::std::string::String::from($key), $crate::parsers::Value::from($value)); )+
        map
    }};
}

/// Replaces the value under `key` with its integer form when it parses as one.
pub(crate) fn coerce_int(args: &mut Args, key: &str) {
    if let Some(value) = args.get_mut(key)
        && let Some(n) = value.as_int()
    {
        *value = Value::Int(n);
    }
}

/// Reads `key` as an integer, treating absent or non-numeric values as zero.
pub(crate) fn int_or_zero(args: &Args, key: &str) -> i64 {
    args.get(key).and_then(Value::as_int).unwrap_or(0)
}

/// Reads `key` as a string slice, if present and textual.
pub(crate) fn str_arg<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_view_parses_digit_strings() {
        assert_eq!(Value::from("42").as_int(), Some(42));
        assert_eq!(Value::from("-3").as_int(), Some(-3));
        assert_eq!(Value::from("four").as_int(), None);
        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn coerce_int_leaves_text_alone() {
        let mut args = crate::args! { "a" => "7", "b" => "seven" };
        coerce_int(&mut args, "a");
        coerce_int(&mut args, "b");
        coerce_int(&mut args, "missing");
        assert_eq!(args, crate::args! { "a" => 7, "b" => "seven" });
    }

    #[test]
    fn tuples_become_lists() {
        assert_eq!(
            Value::from((2i64, 0i64)),
            Value::List(vec![Value::Int(2), Value::Int(0)])
        );
    }

    #[test]
    fn serializes_untagged() {
        let args = crate::args! {
            "n" => 1,
            "s" => "x",
            "none" => Value::Null,
            "pair" => (1i64, 2i64),
        };
        let env = minijinja::Environment::new();
        let out = env
            .render_str("{{ n }}|{{ s }}|{{ none is none }}|{{ pair[1] }}", &args)
            .unwrap();
        assert_eq!(out, "1|x|true|2");
    }

    #[test]
    fn display_nested() {
        let v = Value::from(crate::args! { "k" => vec![1i64, 2] });
        assert_eq!(v.to_string(), "{k: [1, 2]}");
    }
}
