//! Live-feed protocol frames.

use serde::{Deserialize, Serialize};

use lineup_core::Document;

/// Live-feed frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedFrameType {
    // Client -> server
    Subscribe,
    Unsubscribe,
    Heartbeat,

    // Server -> client
    Subscribed,
    Snapshot,
    Error,
}

/// A frame sent to or from the live feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedFrame {
    #[serde(rename = "type")]
    pub frame_type: FeedFrameType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeedFrame {
    /// Creates a frame of the given type with a current timestamp.
    pub fn new(frame_type: FeedFrameType) -> Self {
        Self {
            frame_type,
            collection: None,
            token: None,
            documents: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            error: None,
        }
    }

    /// Creates a SUBSCRIBE frame for a collection.
    pub fn subscribe(collection: &str, token: Option<&str>) -> Self {
        Self {
            frame_type: FeedFrameType::Subscribe,
            collection: Some(collection.to_string()),
            token: token.map(str::to_string),
            documents: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            error: None,
        }
    }

    /// Creates an UNSUBSCRIBE frame for a collection.
    pub fn unsubscribe(collection: &str) -> Self {
        Self {
            frame_type: FeedFrameType::Unsubscribe,
            collection: Some(collection.to_string()),
            token: None,
            documents: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            error: None,
        }
    }

    /// Creates a HEARTBEAT frame.
    pub fn heartbeat() -> Self {
        Self::new(FeedFrameType::Heartbeat)
    }

    /// Creates a SNAPSHOT frame carrying the collection's document set.
    pub fn snapshot(collection: &str, documents: Vec<Document>) -> Self {
        Self {
            frame_type: FeedFrameType::Snapshot,
            collection: Some(collection.to_string()),
            token: None,
            documents: Some(documents),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            error: None,
        }
    }

    /// Serializes to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_frame_shape() {
        let frame = FeedFrame::subscribe("Jugadores", Some("bearer-token"));
        let value: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "SUBSCRIBE");
        assert_eq!(value["collection"], "Jugadores");
        assert_eq!(value["token"], "bearer-token");
        assert!(value.get("documents").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn absent_fields_are_omitted() {
        let frame = FeedFrame::heartbeat();
        let json = frame.to_json().unwrap();
        assert!(!json.contains("collection"));
        assert!(!json.contains("documents"));
        assert!(!json.contains("token"));
    }

    #[test]
    fn snapshot_frame_parses_documents() {
        let raw = json!({
            "type": "SNAPSHOT",
            "collection": "Jugadores",
            "documents": [
                { "id": "p1", "fields": { "nombre": "Ana", "numero": 10 } }
            ]
        })
        .to_string();
        let frame = FeedFrame::from_json(&raw).unwrap();
        assert_eq!(frame.frame_type, FeedFrameType::Snapshot);
        let docs = frame.documents.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "p1");
    }

    #[test]
    fn error_frame_parses_without_optional_fields() {
        let raw = r#"{"type":"ERROR","error":"collection not found"}"#;
        let frame = FeedFrame::from_json(raw).unwrap();
        assert_eq!(frame.frame_type, FeedFrameType::Error);
        assert_eq!(frame.error.as_deref(), Some("collection not found"));
        assert!(frame.documents.is_none());
    }

    #[test]
    fn frame_round_trips() {
        let frame = FeedFrame::snapshot("Jugadores", vec![]);
        let decoded = FeedFrame::from_json(&frame.to_json().unwrap()).unwrap();
        assert_eq!(decoded.frame_type, FeedFrameType::Snapshot);
        assert_eq!(decoded.collection.as_deref(), Some("Jugadores"));
    }
}
