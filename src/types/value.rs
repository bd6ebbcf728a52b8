//! Field values carried by data items.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Largest integer an f64 represents exactly (2^53).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// A single field value: a tagged union over the scalar kinds plus a
/// catch-all for arrays and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Arrays and objects.
    Structured(Value),
}

impl FieldValue {
    /// Stable string form used as the frequency-mode key.
    ///
    /// Strings are returned unchanged, so `2`, `2.0` and `"2"` all map to `"2"`,
    /// and `true` collides with `"true"`. Integral floats below 2^53 print without
    /// a fractional part; other floats use the shortest round-trip form. Arrays
    /// and objects render as compact JSON.
    pub fn canonical_string(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => canonical_number(n),
            FieldValue::String(s) => s.clone(),
            FieldValue::Structured(v) => v.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            other @ (Value::Array(_) | Value::Object(_)) => FieldValue::Structured(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Number(n) => Value::Number(n),
            FieldValue::String(s) => Value::String(s),
            FieldValue::Structured(v) => v,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<f64> for FieldValue {
    /// Non-finite floats have no JSON number form and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(FieldValue::Null, FieldValue::Number)
    }
}

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::from(f as f64)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(n: $t) -> Self {
                    FieldValue::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_string_forms_collide() {
        assert_eq!(FieldValue::from(2).canonical_string(), "2");
        assert_eq!(FieldValue::from(2.0).canonical_string(), "2");
        assert_eq!(FieldValue::from("2").canonical_string(), "2");
        assert_eq!(FieldValue::from(2u64).canonical_string(), "2");
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(FieldValue::from(2.5).canonical_string(), "2.5");
        assert_eq!(FieldValue::from(-0.0).canonical_string(), "0");
        assert_eq!(FieldValue::from(0.1).canonical_string(), "0.1");
        assert_eq!(FieldValue::from(-3.0f32).canonical_string(), "-3");
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(FieldValue::from(f64::NAN).is_null());
        assert!(FieldValue::from(f64::INFINITY).is_null());
    }

    #[test]
    fn test_bool_null_and_structured() {
        assert_eq!(FieldValue::from(true).canonical_string(), "true");
        assert_eq!(FieldValue::Null.canonical_string(), "null");
        assert_eq!(
            FieldValue::from(json!({"b": 1, "a": [1, 2]})).canonical_string(),
            r#"{"a":[1,2],"b":1}"#
        );
    }

    #[test]
    fn test_json_value_mapping() {
        assert_eq!(FieldValue::from(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from(json!("x")), FieldValue::from("x"));
        assert!(matches!(
            FieldValue::from(json!([1])),
            FieldValue::Structured(_)
        ));
        let v: Value = FieldValue::from(7).into();
        assert_eq!(v, json!(7));
    }

    #[test]
    fn test_option_conversion() {
        assert!(FieldValue::from(None::<i32>).is_null());
        assert_eq!(FieldValue::from(Some("a")).as_str(), Some("a"));
    }

    #[test]
    fn test_serde_is_plain_json() {
        let v = FieldValue::from("hello");
        assert_eq!(serde_json::to_string(&v).unwrap(), r#""hello""#);
        let back: FieldValue = serde_json::from_str("30").unwrap();
        assert_eq!(back.as_i64(), Some(30));
    }
}
