use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ContextField;

/// Message attached to every assembled stream result.
pub const FINAL_RESULT_MESSAGE: &str = "Chat query submitted successfully";

/// Status attached to every assembled stream result.
pub const FINAL_RESULT_STATUS: &str = "completed";

/// The result assembled from a completed event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Human-readable summary.
    pub message: String,

    /// The accumulated answer and its metadata.
    pub data: FinalResultData,
}

/// The `data` object of a [`FinalResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResultData {
    /// Last session id seen on the stream.
    pub session_id: String,

    /// Last message id seen on the stream.
    pub message_id: String,

    /// Concatenation of every answer chunk.
    pub answer: String,

    /// Last metrics published on the stream, `null` when none arrived.
    pub metrics: Option<Map<String, Value>>,

    /// Always [`FINAL_RESULT_STATUS`].
    pub status: String,

    /// The caller's context metadata.
    pub context_metadata: Vec<ContextField>,
}

impl FinalResult {
    /// Create a completed `FinalResult`.
    pub fn new(
        session_id: String,
        message_id: String,
        answer: String,
        metrics: Option<Map<String, Value>>,
        context_metadata: Vec<ContextField>,
    ) -> Self {
        Self {
            message: FINAL_RESULT_MESSAGE.to_string(),
            data: FinalResultData {
                session_id,
                message_id,
                answer,
                metrics,
                status: FINAL_RESULT_STATUS.to_string(),
                context_metadata,
            },
        }
    }
}
