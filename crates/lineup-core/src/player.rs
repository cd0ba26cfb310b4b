//! Player record and wire-field mapping.

use serde_json::{json, Value};

use crate::document::Document;

// The deployed collection schema uses Spanish field names; the Rust model
// does not. All mapping between the two goes through this module.

/// Stored field name for a player's display name.
pub const FIELD_NAME: &str = "nombre";
/// Stored field name for a player's jersey number.
pub const FIELD_JERSEY_NUMBER: &str = "numero";
/// Stored field name for a player's nationality.
pub const FIELD_NATIONALITY: &str = "nacionalidad";
/// Stored field name for a player's position.
pub const FIELD_POSITION: &str = "posicion";
/// Stored field name for a player's image reference.
pub const FIELD_IMAGE_REF: &str = "imagen";

/// A roster player.
///
/// The `id` is the store-assigned document identifier. A player with an
/// empty `id` is a draft that has never been persisted; the store assigns
/// the id on creation and it never changes afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub jersey_number: u32,
    pub nationality: String,
    pub position: String,
    pub image_ref: String,
}

impl Player {
    /// Builds an unpersisted draft from user-facing form input.
    ///
    /// The jersey number is parsed from free-form text with
    /// [`parse_jersey_number`]; the other fields are taken as given.
    pub fn draft(
        name: impl Into<String>,
        jersey_input: &str,
        nationality: impl Into<String>,
        position: impl Into<String>,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            jersey_number: parse_jersey_number(jersey_input),
            nationality: nationality.into(),
            position: position.into(),
            image_ref: image_ref.into(),
        }
    }

    /// Returns true when this player has never been persisted.
    pub fn is_draft(&self) -> bool {
        self.id.is_empty()
    }

    /// Returns true when `other` names the same stored record.
    ///
    /// Identity is the store-assigned id; two drafts are never the same
    /// record, whatever their fields say.
    pub fn same_record(&self, other: &Player) -> bool {
        !self.id.is_empty() && self.id == other.id
    }

    /// Maps a raw stored document onto a player.
    ///
    /// Never fails: each missing or malformed field falls back to its zero
    /// value (`""` / `0`) individually.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: string_field(&doc.fields, FIELD_NAME),
            jersey_number: number_field(&doc.fields, FIELD_JERSEY_NUMBER),
            nationality: string_field(&doc.fields, FIELD_NATIONALITY),
            position: string_field(&doc.fields, FIELD_POSITION),
            image_ref: string_field(&doc.fields, FIELD_IMAGE_REF),
        }
    }

    /// Serializes the descriptive fields for storage.
    ///
    /// The id is the document identifier, not a stored field, and is never
    /// included.
    pub fn to_fields(&self) -> Value {
        json!({
            FIELD_NAME: self.name,
            FIELD_JERSEY_NUMBER: self.jersey_number,
            FIELD_NATIONALITY: self.nationality,
            FIELD_POSITION: self.position,
            FIELD_IMAGE_REF: self.image_ref,
        })
    }
}

/// Parses a jersey number from free-form user input.
///
/// Unparsable input (empty, non-numeric, negative) yields 0 rather than an
/// error.
pub fn parse_jersey_number(input: &str) -> u32 {
    input.trim().parse().unwrap_or(0)
}

fn string_field(fields: &Value, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number_field(fields: &Value, key: &str) -> u32 {
    fields
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}
