//! Translation between documents and the service's flat wire schema.

use cairn_client::{ScoredDoc, WireDoc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{StoreError, StoreResult};

/// Wire field carrying a document's id.
pub const ID_FIELD: &str = "id";

/// Conventional content fields checked when the configured text field is absent.
const CONTENT_FALLBACKS: [&str; 2] = ["content", "pageContent"];

/// Alternate vector field stripped from inbound metadata alongside the
/// configured one.
const LITERAL_VECTOR_FIELD: &str = "vector";

/// Fail unless `vector` has the configured dimension.
pub fn validate_dimension(vector: &[f32], expected: usize) -> StoreResult<()> {
    if vector.len() != expected {
        return Err(StoreError::InvalidDimension {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Collision-resistant document id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Flatten a document and its vector into the wire form.
///
/// Metadata entries are spread alongside the reserved fields; a metadata key
/// equal to the id, text, or vector field name silently wins (documented
/// caller contract: those names are reserved).
pub fn to_wire(
    config: &StoreConfig,
    document: &Document,
    vector: &[f32],
    id: Option<String>,
) -> WireDoc {
    let mut wire = Map::new();
    wire.insert(
        ID_FIELD.to_string(),
        Value::String(id.unwrap_or_else(generate_id)),
    );
    wire.insert(
        config.text_field.clone(),
        Value::String(document.content.clone()),
    );
    wire.insert(
        config.vector_field.clone(),
        Value::Array(vector.iter().map(|v| Value::from(f64::from(*v))).collect()),
    );
    for (key, value) in &document.metadata {
        wire.insert(key.clone(), value.clone());
    }
    wire
}

/// Rebuild a document from its wire form.
///
/// Content comes from the configured text field, falling back to the
/// conventional names and finally to the empty string. Metadata is every
/// remaining wire field minus the id field and the vector field under both
/// its configured and literal names.
pub fn from_wire(config: &StoreConfig, wire: &WireDoc) -> Document {
    let content = text_value(wire, &config.text_field)
        .or_else(|| {
            CONTENT_FALLBACKS
                .iter()
                .find_map(|field| text_value(wire, field))
        })
        .unwrap_or_default();

    let mut metadata = wire.clone();
    metadata.remove(&config.text_field);
    metadata.remove(&config.vector_field);
    metadata.remove(LITERAL_VECTOR_FIELD);
    metadata.remove(ID_FIELD);

    Document { content, metadata }
}

/// Read the vector stored in a wire document, when present.
pub fn wire_vector(config: &StoreConfig, wire: &WireDoc) -> Option<Vec<f32>> {
    let value = wire
        .get(&config.vector_field)
        .or_else(|| wire.get(LITERAL_VECTOR_FIELD))?;
    let array = value.as_array()?;
    array
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

/// Read the id stored in a wire document, when present.
pub fn wire_id(wire: &WireDoc) -> Option<&str> {
    wire.get(ID_FIELD).and_then(Value::as_str)
}

/// Turn scored wire results into `(document, score)` pairs, preserving the
/// server's order. A missing score defaults to zero.
pub fn scored_documents(config: &StoreConfig, results: &[ScoredDoc]) -> Vec<(Document, f32)> {
    results
        .iter()
        .map(|scored| (from_wire(config, &scored.doc), scored.score.unwrap_or(0.0)))
        .collect()
}

fn text_value(wire: &WireDoc, field: &str) -> Option<String> {
    wire.get(field).and_then(Value::as_str).map(str::to_owned)
}
