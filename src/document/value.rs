//! Typed field values

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::docid::DocId;
use crate::errors::{DbError, Result};

/// Ordered field map used for document bodies and nested mappings.
pub type Fields = BTreeMap<String, Value>;

/// A field value.
///
/// Serialized externally tagged (`{"Int":5}`, `"Null"`) so every variant,
/// including byte strings and ids, survives a codec round trip with its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(Fields),
    Id(DocId),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Id(_) => "id",
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<DocId> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality used by queries: ints and floats compare numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.loose_eq(vb))
            }
            _ => self == other,
        }
    }

    /// Ordering used by `$lt` / `$gt`.
    ///
    /// Only values of comparable kinds are ordered: numbers with numbers,
    /// strings with strings, and so on. Anything else is `None`, which makes
    /// the operator fail rather than guess.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Id(a), Value::Id(b)) => Some(a.cmp(b)),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// True for a NaN or infinite float anywhere inside this value.
    pub fn has_non_finite(&self) -> bool {
        match self {
            Value::Float(f) => !f.is_finite(),
            Value::Array(items) => items.iter().any(Value::has_non_finite),
            Value::Map(map) => map.values().any(Value::has_non_finite),
            _ => false,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Bytes(_) => 4,
            Value::Id(_) => 5,
            Value::Array(_) => 6,
            Value::Map(_) => 7,
        }
    }

    /// Total order for sorting mixed result sets.
    ///
    /// null < bool < number < string < bytes < id < array < map; within a
    /// kind, [`Value::compare`], with incomparable pairs treated as equal.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.compare(other).unwrap_or(Ordering::Equal))
    }

    /// Converts to plain JSON. Bytes become arrays of numbers, ids hex strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Id(id) => Json::String(id.to_hex()),
        }
    }
}

/// JSON numbers must fit `i64` or `f64`. Integers above `i64::MAX` are
/// rejected rather than silently widened to a float.
impl TryFrom<serde_json::Value> for Value {
    type Error = DbError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    return Err(DbError::InvalidEncoding(format!(
                        "integer {} is out of range for a 64-bit signed value",
                        n
                    )));
                } else {
                    let f = n.as_f64().ok_or_else(|| {
                        DbError::InvalidEncoding(format!("number {} is not representable", n))
                    })?;
                    Value::Float(f)
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Json::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<Result<Fields>>()?,
            ),
        })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Fields> for Value {
    fn from(map: Fields) -> Self {
        Value::Map(map)
    }
}

impl From<DocId> for Value {
    fn from(id: DocId) -> Self {
        Value::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::try_from(json!({"age": 66, "score": 1.5, "tags": ["a"], "x": null})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["age"], Value::Int(66));
        assert_eq!(map["score"], Value::Float(1.5));
        assert_eq!(map["tags"], Value::Array(vec![Value::from("a")]));
        assert_eq!(map["x"], Value::Null);
    }

    #[test]
    fn test_loose_eq_numbers() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::Float(2.0).loose_eq(&Value::Int(2)));
        assert!(!Value::Int(1).loose_eq(&Value::from("1")));
    }

    #[test]
    fn test_compare_rejects_mixed_kinds() {
        assert_eq!(Value::Int(3).compare(&Value::Float(2.5)), Some(Ordering::Greater));
        assert_eq!(Value::from("a").compare(&Value::from("b")), Some(Ordering::Less));
        assert_eq!(Value::Int(3).compare(&Value::from("3")), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_sort_cmp_orders_kinds() {
        assert_eq!(Value::Int(100).sort_cmp(&Value::from("a")), Ordering::Less);
        assert_eq!(Value::Null.sort_cmp(&Value::Bool(false)), Ordering::Less);
        assert_eq!(Value::Int(2).sort_cmp(&Value::Float(1.5)), Ordering::Greater);
    }

    #[test]
    fn test_tagged_serialization_keeps_types() {
        let id = DocId::from_bytes(b"abcdefgh").unwrap();
        let values = vec![
            Value::Bytes(vec![1, 2, 3]),
            Value::Id(id),
            Value::Float(3.0),
            Value::Null,
        ];
        let encoded = serde_json::to_string(&values).unwrap();
        let decoded: Vec<Value> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_to_json() {
        let id = DocId::from_bytes(b"abcdefgh").unwrap();
        assert_eq!(Value::Id(id).to_json(), json!("6162636465666768"));
        assert_eq!(Value::Bytes(vec![7, 8]).to_json(), json!([7, 8]));
    }

    #[test]
    fn test_integer_above_i64_rejected() {
        let err = Value::try_from(json!({"big": 18446744073709551615u64})).unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::InvalidEncoding);

        let max = Value::try_from(json!(i64::MAX)).unwrap();
        assert_eq!(max, Value::Int(i64::MAX));
    }

    #[test]
    fn test_non_finite_found_when_nested() {
        assert!(Value::Float(f64::NAN).has_non_finite());
        assert!(Value::Array(vec![Value::Int(1), Value::Float(f64::INFINITY)]).has_non_finite());
        let nested = Fields::from([("x".to_string(), Value::Float(f64::NEG_INFINITY))]);
        assert!(Value::Map(nested).has_non_finite());
        assert!(!Value::Float(1.5).has_non_finite());
    }
}
