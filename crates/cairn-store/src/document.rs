//! Generic document representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A piece of text plus arbitrary key/value metadata.
///
/// Produced by the caller and translated to the service's flat wire form by
/// [`crate::schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text content.
    pub content: String,
    /// String-keyed metadata; values are arbitrary JSON.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Document with the given metadata.
    pub fn with_metadata(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add one metadata entry.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
