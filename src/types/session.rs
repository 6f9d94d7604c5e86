use serde::{Deserialize, Serialize};

use crate::types::{ContextField, lenient};

/// The body of `POST {base}/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Agents the session may route the query to.
    pub agent_ids: Vec<String>,

    /// Caller-side identifier of the user that owns the session.
    pub external_user_id: String,

    /// Metadata stored with the session.
    pub context_metadata: Vec<ContextField>,
}

impl CreateSessionRequest {
    /// Create a new `CreateSessionRequest`.
    pub fn new(
        agent_ids: Vec<String>,
        external_user_id: impl Into<String>,
        context_metadata: Vec<ContextField>,
    ) -> Self {
        Self {
            agent_ids,
            external_user_id: external_user_id.into(),
            context_metadata,
        }
    }
}

/// The body returned with HTTP 201 from session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// The created session.
    #[serde(default)]
    pub data: SessionData,
}

/// The `data` object of a [`CreateSessionResponse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Server-assigned session identifier.
    #[serde(default)]
    pub id: String,

    /// Metadata the service stored with the session.
    ///
    /// Malformed entries are dropped rather than failing the whole session.
    #[serde(default, deserialize_with = "lenient::optional_list")]
    pub context_metadata: Option<Vec<ContextField>>,
}

/// A chat session created by the service.
///
/// Sessions are immutable and live only as long as the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    context_metadata: Vec<ContextField>,
}

impl Session {
    /// Create a new `Session`.
    pub fn new(id: impl Into<String>, context_metadata: Vec<ContextField>) -> Self {
        Self {
            id: id.into(),
            context_metadata,
        }
    }

    /// The server-assigned session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Metadata the service stored with the session.
    pub fn context_metadata(&self) -> &[ContextField] {
        &self.context_metadata
    }
}

impl From<CreateSessionResponse> for Session {
    fn from(response: CreateSessionResponse) -> Self {
        Session::new(
            response.data.id,
            response.data.context_metadata.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn create_session_request_serialization() {
        let request = CreateSessionRequest::new(
            vec!["agent-1".to_string(), "agent-2".to_string()],
            "user-42",
            vec![ContextField::new("userId", "1")],
        );
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "agentIds": ["agent-1", "agent-2"],
                "externalUserId": "user-42",
                "contextMetadata": [{"key": "userId", "value": "1"}]
            })
        );
    }

    #[test]
    fn create_session_response_deserialization() {
        let json = json!({
            "message": "Chat session created successfully",
            "data": {
                "id": "S1",
                "externalUserId": "user-42",
                "contextMetadata": [
                    {"key": "userId", "value": "1"},
                    {"key": "name", "value": "John"}
                ]
            }
        });
        let session: Session = serde_json::from_value::<CreateSessionResponse>(json)
            .unwrap()
            .into();
        assert_eq!(session.id(), "S1");
        assert_eq!(
            session.context_metadata(),
            &[ContextField::new("userId", "1"), ContextField::new("name", "John")]
        );
    }

    #[test]
    fn malformed_metadata_keeps_the_session() {
        let body = r#"{"data":{"id":"S1","contextMetadata":[{"key":"userId","value":1},{"key":"name","value":"John"}]}}"#;
        let session: Session = serde_json::from_str::<CreateSessionResponse>(body)
            .unwrap()
            .into();
        assert_eq!(session.id(), "S1");
        assert_eq!(session.context_metadata(), &[ContextField::new("name", "John")]);

        let body = r#"{"data":{"id":"S1","contextMetadata":{"userId":1}}}"#;
        let session: Session = serde_json::from_str::<CreateSessionResponse>(body)
            .unwrap()
            .into();
        assert_eq!(session.id(), "S1");
        assert!(session.context_metadata().is_empty());
    }

    #[test]
    fn metadata_is_optional() {
        let json = json!({"data": {"id": "S1", "contextMetadata": null}});
        let session: Session = serde_json::from_value::<CreateSessionResponse>(json)
            .unwrap()
            .into();
        assert_eq!(session.id(), "S1");
        assert!(session.context_metadata().is_empty());
    }
}
