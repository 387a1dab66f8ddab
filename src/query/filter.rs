//! Filter matching
//!
//! A filter is a mapping of field name to condition. Matching is scored:
//! each top-level entry contributes between 0 and 1 and a document matches
//! when the total equals the number of top-level entries.
//!
//! - `"$or": [f1, f2, ...]` contributes 1 when the summed score of the
//!   branches is above zero. A branch does not have to match in full; any
//!   partial score in any branch is enough.
//! - `field: {"$lt": a, "$gt": b, "$in": [...]}` contributes
//!   `1 / len(mapping)` for every recognised operator that holds, so the
//!   entry reaches 1 only when every key of the mapping is a recognised,
//!   satisfied operator.
//! - `field: value` contributes 1 on equality.
//!
//! Missing fields contribute 0.

use crate::document::{DocId, Document, Value, ID_FIELD};
use crate::errors::{DbError, Result};

/// Key of the disjunction entry.
pub const OR_KEY: &str = "$or";

/// Recognised comparison operators.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// `$lt`: field < bound
    Lt(Value),
    /// `$gt`: field > bound
    Gt(Value),
    /// `$in`: field equals one of the listed values
    In(Value),
}

impl Operator {
    fn holds(&self, actual: &Value) -> bool {
        match self {
            Operator::Lt(bound) => actual.compare(bound) == Some(std::cmp::Ordering::Less),
            Operator::Gt(bound) => actual.compare(bound) == Some(std::cmp::Ordering::Greater),
            Operator::In(candidates) => candidates
                .as_array()
                .map_or(false, |items| items.iter().any(|item| actual.loose_eq(item))),
        }
    }
}

/// One top-level filter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `$or` over sub-filters
    Or(Vec<Filter>),
    /// Operator mapping. `arity` is the number of keys in the mapping,
    /// recognised or not.
    Operators {
        field: String,
        operators: Vec<Operator>,
        arity: usize,
    },
    /// Direct equality
    Equals { field: String, value: Value },
}

impl Clause {
    fn score(&self, document: &Document) -> f64 {
        match self {
            Clause::Or(branches) => {
                let total: f64 = branches.iter().map(|b| b.match_score(document)).sum();
                if total > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Clause::Operators {
                field,
                operators,
                arity,
            } => {
                let Some(actual) = document.get(field) else {
                    return 0.0;
                };
                let held = operators.iter().filter(|op| op.holds(&actual)).count();
                if held == 0 {
                    0.0
                } else {
                    held as f64 / *arity as f64
                }
            }
            Clause::Equals { field, value } => match document.get(field) {
                Some(actual) if actual.loose_eq(value) => 1.0,
                _ => 0.0,
            },
        }
    }
}

/// Operands on `_id` written as hex text compare as ids.
fn id_operand(field: &str, value: Value) -> Value {
    if field != ID_FIELD {
        return value;
    }
    match value {
        Value::String(text) => match DocId::from_hex(&text) {
            Ok(id) => Value::Id(id),
            Err(_) => Value::String(text),
        },
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| id_operand(field, item)).collect())
        }
        other => other,
    }
}

/// Parsed filter. The empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// Filter matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses a filter mapping. Non-mapping input is rejected.
    pub fn parse(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Self {
                clauses: map
                    .into_iter()
                    .map(|(field, condition)| Self::parse_clause(field, condition))
                    .collect(),
            }),
            other => Err(DbError::InvalidDocumentType(other.type_name())),
        }
    }

    /// Parses a JSON filter such as `{"age": {"$gt": 30}}`.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        Self::parse(Value::try_from(json)?)
    }

    fn parse_clause(field: String, condition: Value) -> Clause {
        match condition {
            Value::Array(branches) if field == OR_KEY => Clause::Or(
                branches
                    .into_iter()
                    // A branch that is not a mapping can never score.
                    .map(|branch| Self::parse(branch).unwrap_or_default())
                    .collect(),
            ),
            Value::Map(spec) => {
                let arity = spec.len();
                let operators = spec
                    .into_iter()
                    .filter_map(|(op, operand)| {
                        let operand = id_operand(&field, operand);
                        match op.as_str() {
                            "$lt" => Some(Operator::Lt(operand)),
                            "$gt" => Some(Operator::Gt(operand)),
                            "$in" => Some(Operator::In(operand)),
                            _ => None,
                        }
                    })
                    .collect();
                Clause::Operators {
                    field,
                    operators,
                    arity,
                }
            }
            value => Clause::Equals {
                value: id_operand(&field, value),
                field,
            },
        }
    }

    /// Adds an equality entry.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        self.clauses.push(Clause::Equals {
            value: id_operand(&field, value.into()),
            field,
        });
        self
    }

    /// Adds an `$or` entry.
    pub fn or(mut self, branches: Vec<Filter>) -> Self {
        self.clauses.push(Clause::Or(branches));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of top-level entries, `$or` counting as one.
    pub fn field_count(&self) -> usize {
        self.clauses.len()
    }

    /// Sum of the per-entry scores.
    pub fn match_score(&self, document: &Document) -> f64 {
        self.clauses.iter().map(|c| c.score(document)).sum()
    }

    /// True when every entry scored its full weight.
    pub fn matches(&self, document: &Document) -> bool {
        self.match_score(document) == self.field_count() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::IntoDocument;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        json.into_document().unwrap()
    }

    fn filter(json: serde_json::Value) -> Filter {
        Filter::from_json(json).unwrap()
    }

    #[test]
    fn test_equality_all_fields() {
        let f = filter(json!({"age": 66, "name": "b"}));
        assert!(f.matches(&doc(json!({"age": 66, "name": "b"}))));
        assert!(!f.matches(&doc(json!({"age": 66, "name": "a"}))));
        assert_eq!(f.match_score(&doc(json!({"age": 66, "name": "a"}))), 1.0);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"x": 1}))));
        assert!(filter(json!({})).matches(&doc(json!({}))));
    }

    #[test]
    fn test_missing_field_scores_zero() {
        let f = filter(json!({"age": 66}));
        assert_eq!(f.match_score(&doc(json!({"name": "a"}))), 0.0);
    }

    #[test]
    fn test_operators_are_fractional() {
        let f = filter(json!({"age": {"$lt": 100, "$gt": 67}}));
        assert!(f.matches(&doc(json!({"age": 70}))));
        assert_eq!(f.match_score(&doc(json!({"age": 66}))), 0.5);
        assert_eq!(f.match_score(&doc(json!({"age": 123}))), 0.5);
        assert!(!f.matches(&doc(json!({"age": 66}))));
    }

    #[test]
    fn test_unknown_operator_blocks_full_weight() {
        let f = filter(json!({"age": {"$gt": 1, "$ne": 5}}));
        assert_eq!(f.match_score(&doc(json!({"age": 10}))), 0.5);
        assert!(!f.matches(&doc(json!({"age": 10}))));
    }

    #[test]
    fn test_in_operator() {
        let f = filter(json!({"name": {"$in": ["x", "y"]}}));
        assert!(f.matches(&doc(json!({"name": "y"}))));
        assert!(!f.matches(&doc(json!({"name": "z"}))));

        let not_a_list = filter(json!({"name": {"$in": "xy"}}));
        assert!(!not_a_list.matches(&doc(json!({"name": "x"}))));
    }

    #[test]
    fn test_or_counts_once() {
        let f = filter(json!({"$or": [{"age": 66}, {"name": "y"}]}));
        assert_eq!(f.field_count(), 1);
        assert!(f.matches(&doc(json!({"age": 66, "name": "x"}))));
        assert!(f.matches(&doc(json!({"age": 70, "name": "y"}))));
        assert!(!f.matches(&doc(json!({"age": 123, "name": "z"}))));
    }

    #[test]
    fn test_or_branch_needs_only_partial_score() {
        // The branch has two entries and only one holds, yet $or is satisfied.
        let f = filter(json!({"$or": [{"age": 66, "name": "nobody"}]}));
        assert!(f.matches(&doc(json!({"age": 66, "name": "x"}))));
    }

    #[test]
    fn test_or_combined_with_field() {
        let f = filter(json!({"kind": "a", "$or": [{"n": 1}, {"n": 2}]}));
        assert!(f.matches(&doc(json!({"kind": "a", "n": 2}))));
        assert!(!f.matches(&doc(json!({"kind": "b", "n": 2}))));
        assert!(!f.matches(&doc(json!({"kind": "a", "n": 3}))));
    }

    #[test]
    fn test_mixed_kind_comparison_fails_quietly() {
        let f = filter(json!({"age": {"$gt": 10}}));
        assert!(!f.matches(&doc(json!({"age": "eleven"}))));
    }

    #[test]
    fn test_int_float_equality() {
        let f = filter(json!({"score": 2}));
        assert!(f.matches(&doc(json!({"score": 2.0}))));
    }

    #[test]
    fn test_filter_on_id() {
        let id = crate::document::DocId::new();
        let d = Document::new().with("a", 1).with_id(id);
        assert!(Filter::all().eq("_id", id).matches(&d));
    }

    #[test]
    fn test_builder_matches_parsed() {
        let built = Filter::all().eq("age", 66).eq("name", "b");
        let parsed = filter(json!({"age": 66, "name": "b"}));
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_non_mapping_filter_rejected() {
        assert!(Filter::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_id_given_as_hex_matches() {
        let id = crate::document::DocId::new();
        let other = crate::document::DocId::new();
        let d = Document::new().with("a", 1).with_id(id);

        assert!(filter(json!({"_id": id.to_hex()})).matches(&d));
        assert!(filter(json!({"_id": {"$in": [other.to_hex(), id.to_hex()]}})).matches(&d));
        assert!(Filter::all().eq("_id", id.to_hex()).matches(&d));
        assert!(!filter(json!({"_id": "not hex"})).matches(&d));
    }
}
