use serde::Serialize;

use crate::Result;
use crate::types::{FinalResult, SyncResponse};

/// What a query produced, ready to print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// A `sync` response with context metadata injected.
    Sync(SyncResponse),

    /// The result assembled from a `stream` response.
    Stream(FinalResult),
}

impl QueryOutput {
    /// Render as indented JSON.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
