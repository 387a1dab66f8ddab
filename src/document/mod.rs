//! Document model
//!
//! A document is an open mapping of field names to typed [`Value`]s plus a
//! reserved `_id` holding its [`DocId`]. The id is kept apart from the
//! fields so it cannot be shadowed or overwritten through field edits; the
//! merged view (`_id` alongside the fields) is produced on demand.

mod codec;
mod docid;
mod value;

use std::borrow::Cow;

pub use codec::{DocumentCodec, JsonCodec};
pub use docid::DocId;
pub use value::{Fields, Value};

use crate::errors::{DbError, Result};

/// Name of the reserved id field.
pub const ID_FIELD: &str = "_id";

/// A document: optional id plus its fields.
///
/// Documents read back from a collection always carry an id. Documents built
/// by callers may leave it unset; the collection assigns one on insert.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    id: Option<DocId>,
    fields: Fields,
}

impl Document {
    /// Empty document without an id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with a known id and body.
    pub fn from_parts(id: DocId, fields: Fields) -> Self {
        let mut fields = fields;
        fields.remove(ID_FIELD);
        Self {
            id: Some(id),
            fields,
        }
    }

    /// Builder-style field insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Builder-style id assignment.
    pub fn with_id(mut self, id: DocId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<DocId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: DocId) {
        self.id = Some(id);
    }

    /// Body fields, without `_id`.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Number of body fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sets a body field. Writes to `_id` are ignored and return `None`.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        if field == ID_FIELD {
            return None;
        }
        self.fields.insert(field, value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Merged-view lookup: `_id` resolves to `Value::Id`.
    pub fn get(&self, field: &str) -> Option<Cow<'_, Value>> {
        if field == ID_FIELD {
            return self.id.map(|id| Cow::Owned(Value::Id(id)));
        }
        self.fields.get(field).map(Cow::Borrowed)
    }

    pub fn contains(&self, field: &str) -> bool {
        if field == ID_FIELD {
            self.id.is_some()
        } else {
            self.fields.contains_key(field)
        }
    }

    /// Merged view as a map value.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(id) = self.id {
            map.insert(ID_FIELD.to_string(), Value::Id(id));
        }
        Value::Map(map)
    }

    /// Merged view as plain JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    fn from_map(mut map: Fields) -> Result<Self> {
        let id = match map.remove(ID_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::Id(id)) => Some(id),
            Some(Value::Bytes(bytes)) => Some(DocId::from_bytes(&bytes)?),
            Some(Value::String(hex)) => Some(DocId::from_hex(&hex)?),
            Some(other) => {
                return Err(DbError::InvalidEncoding(format!(
                    "{} of type {} is not an id",
                    ID_FIELD,
                    other.type_name()
                )))
            }
        };
        Ok(Self { id, fields: map })
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.to_value()
    }
}

/// Conversion into a document, rejecting anything that is not a mapping.
pub trait IntoDocument {
    fn into_document(self) -> Result<Document>;

    /// Body fields only. Any `_id` entry is dropped unparsed, so replacing a
    /// keyed document never fails on what the caller put there.
    fn into_body(self) -> Result<Fields>;
}

impl IntoDocument for Document {
    fn into_document(self) -> Result<Document> {
        Ok(self)
    }

    fn into_body(self) -> Result<Fields> {
        Ok(self.fields)
    }
}

impl IntoDocument for &Document {
    fn into_document(self) -> Result<Document> {
        Ok(self.clone())
    }

    fn into_body(self) -> Result<Fields> {
        Ok(self.fields.clone())
    }
}

impl IntoDocument for Fields {
    fn into_document(self) -> Result<Document> {
        Document::from_map(self)
    }

    fn into_body(mut self) -> Result<Fields> {
        self.remove(ID_FIELD);
        Ok(self)
    }
}

impl IntoDocument for Value {
    fn into_document(self) -> Result<Document> {
        match self {
            Value::Map(map) => Document::from_map(map),
            other => Err(DbError::InvalidDocumentType(other.type_name())),
        }
    }

    fn into_body(self) -> Result<Fields> {
        match self {
            Value::Map(map) => map.into_body(),
            other => Err(DbError::InvalidDocumentType(other.type_name())),
        }
    }
}

impl IntoDocument for serde_json::Value {
    fn into_document(self) -> Result<Document> {
        Value::try_from(self)?.into_document()
    }

    fn into_body(self) -> Result<Fields> {
        Value::try_from(self)?.into_body()
    }
}
