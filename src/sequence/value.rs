//! Parameter values carried by events

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single parameter value
///
/// Lists expand into chords or unison stacks inside the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    List(Vec<f64>),
    Text(String),
}

impl Value {
    /// The scalar value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric entries: a number becomes a one-element slice
    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Value::Number(n) => Some(std::slice::from_ref(n)),
            Value::List(list) => Some(list),
            Value::Text(_) => None,
        }
    }

    /// The string value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Apply `f` to every numeric entry, keeping the shape
    pub fn map_numbers(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Number(n) => Value::Number(f(*n)),
            Value::List(list) => Value::List(list.iter().copied().map(f).collect()),
            Value::Text(s) => Value::Text(s.clone()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Value::Text(_))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<f64>> for Value {
    fn from(list: Vec<f64>) -> Self {
        Value::List(list)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::List(list) => {
                write!(f, "[")?;
                for (i, n) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", n)?;
                }
                write!(f, "]")
            }
            Value::Text(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Number(0.5).as_number(), Some(0.5));
        assert_eq!(Value::List(vec![1.0, 2.0]).as_number(), None);
        assert_eq!(Value::Number(3.0).as_numbers(), Some(&[3.0][..]));
        assert_eq!(Value::from("saw").as_text(), Some("saw"));
        assert!(!Value::from("saw").is_numeric());
    }

    #[test]
    fn test_map_numbers_keeps_shape() {
        let chord = Value::List(vec![1.0, 2.0]).map_numbers(|n| n * 10.0);
        assert_eq!(chord, Value::List(vec![10.0, 20.0]));
    }

    #[test]
    fn test_untagged_yaml() {
        let n: Value = serde_yaml::from_str("5000").unwrap();
        assert_eq!(n, Value::Number(5000.0));

        let list: Value = serde_yaml::from_str("[60, 64, 67]").unwrap();
        assert_eq!(list, Value::List(vec![60.0, 64.0, 67.0]));

        let text: Value = serde_yaml::from_str("square").unwrap();
        assert_eq!(text, Value::Text("square".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::List(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
        assert_eq!(Value::Number(0.25).to_string(), "0.25");
    }
}
