//! Quote escaping for values embedded in literal SQL.
//!
//! Escaping follows the `addslashes` convention: `\`, `'`, `"` and NUL are
//! prefixed with a backslash. This is character escaping only; it is not a
//! substitute for bound parameters.

use std::fmt;

/// A value that can be written into SQL text.
///
/// Scalars render directly; [`Value::List`] and [`Value::Map`] exist so that
/// nested input can be escaped in one pass with [`escape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    /// Ordered key/value pairs.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Render this value as it appears inside SQL text (before quoting).
    ///
    /// Booleans render as `1`/`0`; lists and maps render their elements
    /// comma-joined.
    pub fn to_sql_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Value::List(items) => items
                .iter()
                .map(Value::to_sql_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(pairs) => pairs
                .iter()
                .map(|(_, v)| v.to_sql_text())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_text())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

/// Escape a single string.
pub fn escape_str(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

/// Escape every string inside `value`, keeping its shape.
///
/// Non-text scalars are returned unchanged. Map keys are not escaped.
pub fn escape(value: &Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(escape_str(s)),
        Value::List(items) => Value::List(items.iter().map(escape).collect()),
        Value::Map(pairs) => Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), escape(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_str_addslashes_set() {
        assert_eq!(escape_str("O'Brien"), "O\\'Brien");
        assert_eq!(escape_str(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_str(r"C:\tmp"), r"C:\\tmp");
        assert_eq!(escape_str("a\0b"), "a\\0b");
        assert_eq!(escape_str("plain"), "plain");
    }

    #[test]
    fn test_escape_keeps_shape() {
        let input = Value::Map(vec![
            ("name".to_string(), Value::from("it's")),
            ("age".to_string(), Value::from(42)),
            (
                "tags".to_string(),
                Value::List(vec![Value::from("a'b"), Value::from(true)]),
            ),
        ]);

        let escaped = escape(&input);
        assert_eq!(
            escaped,
            Value::Map(vec![
                ("name".to_string(), Value::from("it\\'s")),
                ("age".to_string(), Value::Int(42)),
                (
                    "tags".to_string(),
                    Value::List(vec![Value::from("a\\'b"), Value::Bool(true)]),
                ),
            ])
        );
    }

    #[test]
    fn test_to_sql_text() {
        assert_eq!(Value::from(7u8).to_sql_text(), "7");
        assert_eq!(Value::from(false).to_sql_text(), "0");
        assert_eq!(Value::from(vec![1, 2, 3]).to_sql_text(), "1,2,3");
        assert_eq!(Value::from(1.5).to_sql_text(), "1.5");
    }
}
