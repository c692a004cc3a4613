use mongodb::bson::{self, Bson, Document};
use serde_json::Value;

use crate::error::ApiError;

/// Convert a JSON object into a BSON document. Anything that is not an
/// object is a caller mistake, reported before any I/O happens.
pub fn json_to_document(value: &Value) -> Result<Document, ApiError> {
    match value {
        Value::Object(_) => bson::to_document(value)
            .map_err(|e| ApiError::Validation(format!("invalid document: {e}"))),
        _ => Err(ApiError::Validation("expected a JSON object".to_string())),
    }
}

/// Convert BSON Document -> JSON Value (relaxed extended JSON, so ObjectId
/// and dates stay readable in the browser).
pub fn document_to_json(doc: &Document) -> Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

/// Render an inserted id for the response. ObjectIds go out as their
/// 24-hex string so the UI can feed them straight back into a filter.
pub fn inserted_id_to_json(id: Bson) -> Value {
    match id {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}
