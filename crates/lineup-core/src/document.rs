//! Raw payloads pushed by the remote store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw document as stored remotely: the store-assigned identifier plus
/// the stored field object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    /// Creates a document from an id and its stored fields.
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// A push notification carrying the remote collection's current full
/// document set.
///
/// Each batch is authoritative: the projection is re-derived from it in
/// full, so a batch also communicates deletions by omission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub documents: Vec<Document>,
}

impl ChangeBatch {
    /// Creates a batch from the collection's current document set.
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_round_trips_through_json() {
        let doc = Document::new("doc-1", json!({ "nombre": "Ana" }));
        let encoded = serde_json::to_string(&doc).unwrap();
        let decoded: Document = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn empty_batch_is_default() {
        assert_eq!(ChangeBatch::default(), ChangeBatch::new(Vec::new()));
    }
}
