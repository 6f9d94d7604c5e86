use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::types::ContextField;

/// The document returned by a `sync` query.
///
/// The service's payload is open-ended, so it is kept as a generic JSON document and
/// re-serialized with every field it arrived with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncResponse(Value);

impl SyncResponse {
    /// Parse a response body.
    pub fn from_body(body: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(body)?))
    }

    /// Insert `contextMetadata` into the nested `data` object.
    ///
    /// Documents without an object under `data` are returned unchanged.
    pub fn with_context_metadata(mut self, context_metadata: &[ContextField]) -> Result<Self> {
        if let Some(data) = self.0.get_mut("data").and_then(Value::as_object_mut) {
            data.insert(
                "contextMetadata".to_string(),
                serde_json::to_value(context_metadata)?,
            );
        }
        Ok(self)
    }

    /// The nested `data` object, if any.
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data")
    }

    /// The whole document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for SyncResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
