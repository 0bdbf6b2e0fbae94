//! Story variables and their values.

use serde::{Deserialize, Serialize};

use crate::VariableId;

/// Declared type of a story variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Integer,
    Float,
    String,
    Boolean,
    /// Stored as a 0..1 fraction.
    Percent,
}

impl VariableKind {
    /// Whether values of this kind compare and combine numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            VariableKind::Integer | VariableKind::Float | VariableKind::Percent
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Integer => "integer",
            VariableKind::Float => "float",
            VariableKind::String => "string",
            VariableKind::Boolean => "boolean",
            VariableKind::Percent => "percent",
        }
    }
}

/// Runtime value of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl VariableValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariableValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VariableValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value the way string concatenation sees it.
    pub fn to_display_string(&self) -> String {
        match self {
            VariableValue::Bool(b) => b.to_string(),
            VariableValue::Number(n) => n.to_string(),
            VariableValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for VariableValue {
    fn from(n: f64) -> Self {
        VariableValue::Number(n)
    }
}

impl From<i64> for VariableValue {
    fn from(n: i64) -> Self {
        VariableValue::Number(n as f64)
    }
}

impl From<i32> for VariableValue {
    fn from(n: i32) -> Self {
        VariableValue::Number(n as f64)
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Bool(b)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::Text(s)
    }
}

impl std::fmt::Display for VariableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// A named, typed story variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: VariableId,

    /// Display name shown to authors.
    pub name: String,

    pub kind: VariableKind,

    /// Current value (the default when read from `StoryData`).
    pub value: VariableValue,
}

impl Variable {
    /// Create a variable with an explicit kind and value.
    pub fn new(
        id: impl Into<VariableId>,
        name: impl Into<String>,
        kind: VariableKind,
        value: impl Into<VariableValue>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn integer(id: impl Into<VariableId>, name: impl Into<String>, value: i64) -> Self {
        Self::new(id, name, VariableKind::Integer, value)
    }

    pub fn float(id: impl Into<VariableId>, name: impl Into<String>, value: f64) -> Self {
        Self::new(id, name, VariableKind::Float, value)
    }

    pub fn string(
        id: impl Into<VariableId>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(id, name, VariableKind::String, value.into())
    }

    pub fn boolean(id: impl Into<VariableId>, name: impl Into<String>, value: bool) -> Self {
        Self::new(id, name, VariableKind::Boolean, value)
    }

    /// Create a percent variable from a 0..1 fraction.
    pub fn percent(id: impl Into<VariableId>, name: impl Into<String>, fraction: f64) -> Self {
        Self::new(id, name, VariableKind::Percent, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_kinds() {
        assert!(VariableKind::Integer.is_numeric());
        assert!(VariableKind::Float.is_numeric());
        assert!(VariableKind::Percent.is_numeric());
        assert!(!VariableKind::String.is_numeric());
        assert!(!VariableKind::Boolean.is_numeric());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(VariableValue::from(3).as_number(), Some(3.0));
        assert_eq!(VariableValue::from(true).as_bool(), Some(true));
        assert_eq!(VariableValue::from("abc").as_text(), Some("abc"));
        assert_eq!(VariableValue::from("abc").as_number(), None);
    }

    #[test]
    fn test_value_untagged_json() {
        let values: Vec<VariableValue> = serde_json::from_str(r#"[1.5, true, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                VariableValue::Number(1.5),
                VariableValue::Bool(true),
                VariableValue::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_variable_constructors() {
        let score = Variable::integer("score", "Score", 10);
        assert_eq!(score.kind, VariableKind::Integer);
        assert_eq!(score.value, VariableValue::Number(10.0));

        let luck = Variable::percent("luck", "Luck", 0.25);
        assert_eq!(luck.kind, VariableKind::Percent);
        assert_eq!(luck.value.as_number(), Some(0.25));
    }
}
