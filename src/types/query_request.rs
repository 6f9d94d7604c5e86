use serde::{Deserialize, Serialize};

use crate::types::{ModelConfigs, ResponseMode};

/// The body of `POST {base}/sessions/{id}/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// The model endpoint that fulfills the query.
    pub endpoint_id: String,

    /// The query text.
    pub query: String,

    /// Agents the query may be routed to.
    pub agent_ids: Vec<String>,

    /// How the answer is delivered.
    pub response_mode: ResponseMode,

    /// How much reasoning the service spends on the query.
    pub reasoning_mode: String,

    /// Model parameters.
    pub model_configs: ModelConfigs,
}
