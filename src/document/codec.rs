//! Document codec seam
//!
//! The engine never looks inside a stored document's bytes; it hands a
//! document to a [`DocumentCodec`] and stores whatever comes back.

use serde::{Deserialize, Serialize};

use super::docid::DocId;
use super::value::Fields;
use super::Document;
use crate::errors::{DbError, Result};

/// Encodes one document to bytes and back.
pub trait DocumentCodec: Send {
    /// Encodes a document that has already been assigned its id.
    fn encode(&self, id: DocId, fields: &Fields) -> Result<Vec<u8>>;

    /// Decodes bytes produced by [`DocumentCodec::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<Document>;
}

#[derive(Serialize)]
struct StoredRef<'a> {
    #[serde(rename = "_id")]
    id: DocId,
    fields: &'a Fields,
}

#[derive(Deserialize)]
struct StoredOwned {
    #[serde(rename = "_id")]
    id: DocId,
    fields: Fields,
}

/// Default codec: `{"_id": "<hex>", "fields": {...}}` as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn encode(&self, id: DocId, fields: &Fields) -> Result<Vec<u8>> {
        // JSON has no NaN or infinity; serde_json would write `null` and the
        // record could never be decoded again.
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.has_non_finite()) {
            return Err(DbError::Codec(format!(
                "Field '{}' holds a non-finite float, which JSON cannot store",
                name
            )));
        }
        Ok(serde_json::to_vec(&StoredRef { id, fields })?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document> {
        let stored: StoredOwned = serde_json::from_slice(bytes)
            .map_err(|e| DbError::Codec(format!("Failed to decode document: {}", e)))?;
        Ok(Document::from_parts(stored.id, stored.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;

    #[test]
    fn test_id_stays_out_of_fields() {
        let id = DocId::from_bytes(b"ABCDEFGH").unwrap();
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from("a"));

        let bytes = JsonCodec.encode(id, &fields).unwrap();
        let doc = JsonCodec.decode(&bytes).unwrap();

        assert_eq!(doc.id(), Some(id));
        assert_eq!(doc.fields(), &fields);
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = JsonCodec.decode(b"not json").unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::Codec);
    }

    #[test]
    fn test_non_finite_float_rejected_before_encoding() {
        let id = DocId::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut fields = Fields::new();
            fields.insert("ok".into(), Value::Float(1.0));
            fields.insert("x".into(), Value::Array(vec![Value::Float(bad)]));
            let err = JsonCodec.encode(id, &fields).unwrap_err();
            assert_eq!(err.code(), crate::errors::ErrorCode::Codec);
        }
    }
}
