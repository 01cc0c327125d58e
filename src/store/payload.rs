//! Helpers for converting between documents and stored payloads.

use serde_json::{Map, Value};

use super::types::{Document, StoreError};

/// Build the payload stored alongside a document's vector.
///
/// The result is a copy of `metadata` with `content_key` set to `text`; `metadata` itself is
/// left untouched.
pub fn build_payload(
    metadata: &Map<String, Value>,
    content_key: &str,
    text: &str,
) -> Map<String, Value> {
    let mut payload = metadata.clone();
    payload.insert(content_key.to_string(), Value::String(text.to_string()));
    payload
}

/// Rebuild a document from a stored payload by lifting `content_key` back into the text.
pub fn payload_into_document(
    id: &str,
    mut payload: Map<String, Value>,
    content_key: &str,
    score: Option<f32>,
) -> Result<Document, StoreError> {
    match payload.remove(content_key) {
        Some(Value::String(page_content)) => Ok(Document {
            page_content,
            metadata: payload,
            score,
        }),
        _ => Err(StoreError::MissingContent {
            id: id.to_string(),
            content_key: content_key.to_string(),
        }),
    }
}
