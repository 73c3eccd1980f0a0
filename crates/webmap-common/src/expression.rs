//! MapLibre style expressions.
//!
//! Expressions are built as a typed tree and only flattened into the
//! nested-array wire format when serialized, e.g.
//! `Expr::Get("ZONE")` becomes `["get", "ZONE"]`.

use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Paint property bag keyed by MapLibre property name (`fill-color`, ...).
///
/// Ordered so that repeated conversions serialize identically.
pub type Paint = BTreeMap<String, Expr>;

/// A MapLibre expression or literal paint value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Plain JSON value (color string, number, ...)
    Literal(Value),
    /// `["get", field]`
    Get(String),
    /// `["to-string", input]`
    ToString(Box<Expr>),
    /// `["==", left, right]`
    Equals(Box<Expr>, Box<Expr>),
    /// `["match", input, label1, output1, ..., fallback]`
    Match {
        input: Box<Expr>,
        cases: Vec<(String, Expr)>,
        fallback: Box<Expr>,
    },
    /// `["step", input, base, threshold1, output1, ...]`
    Step {
        input: Box<Expr>,
        base: Box<Expr>,
        stops: Vec<(f64, Expr)>,
    },
    /// `["interpolate", ["linear"], input, value1, output1, ...]`
    Interpolate {
        input: Box<Expr>,
        stops: Vec<(f64, Expr)>,
    },
    /// `["case", condition1, output1, ..., fallback]`
    Case {
        branches: Vec<(Expr, Expr)>,
        fallback: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn number(value: f64) -> Self {
        Expr::Literal(Value::from(value))
    }

    pub fn get(field: impl Into<String>) -> Self {
        Expr::Get(field.into())
    }

    /// Field value coerced to a string, so numeric and string data compare
    /// the same way against match labels.
    pub fn get_as_string(field: impl Into<String>) -> Self {
        Expr::ToString(Box::new(Expr::get(field)))
    }

    pub fn is_null(input: Expr) -> Self {
        Expr::Equals(Box::new(input), Box::new(Expr::Literal(Value::Null)))
    }

    /// Build a match expression. Repeated labels are dropped (first wins)
    /// since MapLibre rejects duplicate branch labels.
    pub fn matching(input: Expr, cases: Vec<(String, Expr)>, fallback: Expr) -> Self {
        let mut unique: Vec<(String, Expr)> = Vec::with_capacity(cases.len());
        for (label, output) in cases {
            if unique.iter().any(|(seen, _)| *seen == label) {
                continue;
            }
            unique.push((label, output));
        }
        Expr::Match {
            input: Box::new(input),
            cases: unique,
            fallback: Box::new(fallback),
        }
    }

    pub fn step(input: Expr, base: Expr, stops: Vec<(f64, Expr)>) -> Self {
        Expr::Step {
            input: Box::new(input),
            base: Box::new(base),
            stops,
        }
    }

    pub fn interpolate_linear(input: Expr, stops: Vec<(f64, Expr)>) -> Self {
        Expr::Interpolate {
            input: Box::new(input),
            stops,
        }
    }

    pub fn case(branches: Vec<(Expr, Expr)>, fallback: Expr) -> Self {
        Expr::Case {
            branches,
            fallback: Box::new(fallback),
        }
    }

    /// Render to the JSON wire format.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(Value::from(s))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Value::from(s))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::number(n)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Literal(value) => value.serialize(serializer),
            Expr::Get(field) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("get")?;
                seq.serialize_element(field)?;
                seq.end()
            }
            Expr::ToString(input) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("to-string")?;
                seq.serialize_element(input)?;
                seq.end()
            }
            Expr::Equals(left, right) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element("==")?;
                seq.serialize_element(left)?;
                seq.serialize_element(right)?;
                seq.end()
            }
            Expr::Match {
                input,
                cases,
                fallback,
            } => {
                // A match with no branches is not valid MapLibre.
                if cases.is_empty() {
                    return fallback.serialize(serializer);
                }
                let mut seq = serializer.serialize_seq(Some(3 + cases.len() * 2))?;
                seq.serialize_element("match")?;
                seq.serialize_element(input)?;
                for (label, output) in cases {
                    seq.serialize_element(label)?;
                    seq.serialize_element(output)?;
                }
                seq.serialize_element(fallback)?;
                seq.end()
            }
            Expr::Step { input, base, stops } => {
                let mut seq = serializer.serialize_seq(Some(3 + stops.len() * 2))?;
                seq.serialize_element("step")?;
                seq.serialize_element(input)?;
                seq.serialize_element(base)?;
                for (threshold, output) in stops {
                    seq.serialize_element(threshold)?;
                    seq.serialize_element(output)?;
                }
                seq.end()
            }
            Expr::Interpolate { input, stops } => {
                let mut seq = serializer.serialize_seq(Some(3 + stops.len() * 2))?;
                seq.serialize_element("interpolate")?;
                seq.serialize_element(&["linear"])?;
                seq.serialize_element(input)?;
                for (value, output) in stops {
                    seq.serialize_element(value)?;
                    seq.serialize_element(output)?;
                }
                seq.end()
            }
            Expr::Case { branches, fallback } => {
                let mut seq = serializer.serialize_seq(Some(2 + branches.len() * 2))?;
                seq.serialize_element("case")?;
                for (condition, output) in branches {
                    seq.serialize_element(condition)?;
                    seq.serialize_element(output)?;
                }
                seq.serialize_element(fallback)?;
                seq.end()
            }
        }
    }
}

/// Deserialized expressions stay opaque JSON; they serialize back unchanged.
impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Expr::Literal)
    }
}

/// Format a number the way JavaScript's `String(n)` does for ordinary
/// values: integral floats drop the fraction (`11`, not `11.0`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{}", value)
}

/// Plain decimal literal: no sign prefix, whitespace or leading zeros.
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").unwrap());

/// Canonical string form of a unique-value entry, matching what
/// `["to-string", ["get", field]]` yields for the same data.
///
/// Numeric strings such as `"11.0"` are written the way the number itself
/// would be (`"11"`). Codes like `"007"` keep their text.
pub fn match_label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| n.to_string()),
        Value::String(s) => canonical_numeric(s).unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}

fn canonical_numeric(s: &str) -> Option<String> {
    if !DECIMAL.is_match(s) {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(format_number)
}
