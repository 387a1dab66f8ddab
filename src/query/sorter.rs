//! Result ordering
//!
//! Sort specs are `"<field>"` or `"<field> desc"`. Ordering is a stable
//! ascending sort on the field; documents without the field go last. A
//! descending spec reverses the ascending result, so ties come out in
//! reverse of their scan order.

use std::cmp::Ordering;

use crate::document::Document;

/// Parsed sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses `"age"` / `"age desc"`. Blank input means no ordering.
    ///
    /// Only a second token of exactly `desc` selects descending order.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut tokens = spec.split_whitespace();
        let field = tokens.next()?;
        let descending = tokens.next() == Some("desc");
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// Sorts query results in place.
pub struct ResultSorter;

impl ResultSorter {
    pub fn sort(documents: &mut [Document], spec: &SortSpec) {
        documents.sort_by(|a, b| Self::compare_field(a, b, &spec.field));
        if spec.descending {
            documents.reverse();
        }
    }

    fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
        match (a.get(field), b.get(field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.sort_cmp(&y),
        }
    }
}
