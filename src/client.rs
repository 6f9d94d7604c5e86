use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode, header};
use url::Url;

use crate::accumulator::consume_stream;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, SESSIONS_CREATED,
    SESSIONS_FAILED,
};
use crate::sse::{StreamRecord, process_event_stream};
use crate::types::{
    ContextField, CreateSessionRequest, CreateSessionResponse, QueryOutput, QueryRequest,
    ResponseMode, Session, SyncResponse,
};

/// Base URL of the hosted chat API.
pub const DEFAULT_API_URL: &str = "https://api.on-demand.io/chat/v1";

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "ONDEMAND_API_KEY";

/// Placeholder shipped in sample configurations; never a valid key.
pub const API_KEY_PLACEHOLDER: &str = "<your_api_key>";

/// Header that carries the API key.
const API_KEY_HEADER: &str = "apikey";

/// The two calls a chat run makes against the service.
///
/// [`OnDemand`] talks to the real API; tests substitute in-memory implementations.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create a session.  Only HTTP 201 counts as success.
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session>;

    /// Submit a query against an existing session.
    ///
    /// Returns `Ok(None)` when the response mode is neither `sync` nor `stream`.
    async fn submit_query(
        &self,
        session_id: &str,
        request: &QueryRequest,
        context_metadata: &[ContextField],
    ) -> Result<Option<QueryOutput>>;
}

/// Client for the on-demand chat API.
#[derive(Debug, Clone)]
pub struct OnDemand {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl OnDemand {
    /// Create a new client against the hosted API.
    ///
    /// The API key can be provided directly or read from the ONDEMAND_API_KEY environment
    /// variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// Without a timeout the client waits as long as the connection stays open.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::configuration(format!(
                    "API key not provided and {API_KEY_ENV} environment variable not set"
                ))
            })?,
        };
        validate_api_key(&api_key)?;

        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("base URL '{base_url}' cannot carry a path"),
                None,
            ));
        }

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for a path below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::url(
                    format!("base URL '{}' cannot carry a path", self.base_url),
                    None,
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let api_key = HeaderValue::from_str(&self.api_key).map_err(|_| {
            Error::validation(
                "API key contains characters not allowed in a header",
                Some("api_key".to_string()),
            )
        })?;
        headers.insert(API_KEY_HEADER, api_key);
        Ok(headers)
    }

    /// Convert a failed send into our Error type.
    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// POST a JSON body and return the raw response, whatever its status.
    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: Url,
        headers: HeaderMap,
        body: &T,
    ) -> Result<Response> {
        tracing::debug!(
            url = %url,
            body = %serde_json::to_string(body).unwrap_or_default(),
            "sending request"
        );
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            self.send_error(e)
        })
    }

    /// Read the body of a response as text.
    async fn read_body(&self, response: Response) -> Result<String> {
        response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Timed out reading response: {e}"),
                    self.timeout.map(|t| t.as_secs_f64()),
                )
            } else {
                Error::http_client(
                    format!("Failed to read response: {e}"),
                    Some(Box::new(e)),
                )
            }
        })
    }

    /// Turn an unexpected status into our Error type, keeping the raw body.
    async fn process_error_response(&self, response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        match self.read_body(response).await {
            Ok(body) => Error::from_status(status_code, body, request_id, retry_after),
            Err(e) => e,
        }
    }

    /// Create a chat session.
    ///
    /// Only HTTP 201 is success; any other status is an error carrying the raw body.
    pub async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        let url = self.endpoint(&["sessions"])?;
        tracing::info!(url = %url, "creating chat session");

        let response = self.post(url, self.default_headers()?, request).await?;
        if response.status() != StatusCode::CREATED {
            SESSIONS_FAILED.click();
            return Err(self.process_error_response(response).await);
        }

        let body = self.read_body(response).await?;
        let session: Session = serde_json::from_str::<CreateSessionResponse>(&body)
            .map_err(|e| {
                SESSIONS_FAILED.click();
                Error::serialization(
                    format!("Failed to parse session response: {e}"),
                    Some(Box::new(e)),
                )
            })?
            .into();
        if session.id().is_empty() {
            SESSIONS_FAILED.click();
            return Err(Error::serialization(
                format!("session response carried no session id: {body}"),
                None,
            ));
        }

        SESSIONS_CREATED.click();
        tracing::info!(session_id = session.id(), "chat session created");
        Ok(session)
    }

    /// POST a query and return the raw response.
    async fn post_query(
        &self,
        session_id: &str,
        request: &QueryRequest,
        headers: HeaderMap,
    ) -> Result<Response> {
        let url = self.endpoint(&["sessions", session_id, "query"])?;
        tracing::info!(
            url = %url,
            response_mode = %request.response_mode,
            "submitting query"
        );
        self.post(url, headers, request).await
    }

    /// Submit a `sync` query and return the response document.
    ///
    /// Only HTTP 200 is success.
    pub async fn query_sync(&self, session_id: &str, request: &QueryRequest) -> Result<SyncResponse> {
        let response = self
            .post_query(session_id, request, self.default_headers()?)
            .await?;
        if response.status() != StatusCode::OK {
            return Err(self.process_error_response(response).await);
        }
        let body = self.read_body(response).await?;
        SyncResponse::from_body(&body)
    }

    /// Submit a `stream` query and return its classified records.
    pub async fn query_stream(
        &self,
        session_id: &str,
        request: &QueryRequest,
    ) -> Result<impl Stream<Item = Result<StreamRecord>> + Send> {
        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let response = self.post_query(session_id, request, headers).await?;
        if !response.status().is_success() {
            return Err(self.process_error_response(response).await);
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });
        Ok(process_event_stream(stream))
    }

    /// Submit a query and produce its output according to the response mode.
    pub async fn submit_query(
        &self,
        session_id: &str,
        request: &QueryRequest,
        context_metadata: &[ContextField],
    ) -> Result<Option<QueryOutput>> {
        match &request.response_mode {
            ResponseMode::Sync => {
                let response = self
                    .query_sync(session_id, request)
                    .await?
                    .with_context_metadata(context_metadata)?;
                Ok(Some(QueryOutput::Sync(response)))
            }
            ResponseMode::Stream => {
                let records = self.query_stream(session_id, request).await?;
                let result = consume_stream(records, context_metadata).await?;
                Ok(Some(QueryOutput::Stream(result)))
            }
            ResponseMode::Custom(mode) => {
                let response = self
                    .post_query(session_id, request, self.default_headers()?)
                    .await?;
                tracing::warn!(
                    response_mode = %mode,
                    status = response.status().as_u16(),
                    "response mode is neither sync nor stream; producing no output"
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ChatApi for OnDemand {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        OnDemand::create_session(self, request).await
    }

    async fn submit_query(
        &self,
        session_id: &str,
        request: &QueryRequest,
        context_metadata: &[ContextField],
    ) -> Result<Option<QueryOutput>> {
        OnDemand::submit_query(self, session_id, request, context_metadata).await
    }
}

/// Reject API keys that are empty or still the sample placeholder.
pub fn validate_api_key(api_key: &str) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() || api_key == API_KEY_PLACEHOLDER {
        return Err(Error::configuration(format!(
            "set an API key with --api-key or {API_KEY_ENV}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = OnDemand::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);

        let client = OnDemand::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com/chat/v1/".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(
            client.base_url.as_str(),
            "https://custom-api.example.com/chat/v1/"
        );
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn placeholder_and_empty_keys_are_rejected() {
        for key in ["", "   ", API_KEY_PLACEHOLDER] {
            let err = OnDemand::new(Some(key.to_string())).unwrap_err();
            assert!(err.is_configuration(), "{key:?} should be rejected");
            assert_eq!(err.exit_code(), crate::error::EXIT_CONFIGURATION);
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OnDemand::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));

        let err = OnDemand::with_options(
            Some("k".to_string()),
            Some("mailto:chat@example.com".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn endpoints_join_below_the_base_path() {
        let client = OnDemand::new(Some("k".to_string())).unwrap();
        assert_eq!(
            client.endpoint(&["sessions"]).unwrap().as_str(),
            "https://api.on-demand.io/chat/v1/sessions"
        );
        assert_eq!(
            client
                .endpoint(&["sessions", "S1", "query"])
                .unwrap()
                .as_str(),
            "https://api.on-demand.io/chat/v1/sessions/S1/query"
        );

        let client = OnDemand::with_options(
            Some("k".to_string()),
            Some("http://localhost:8080/chat/v1/".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            client
                .endpoint(&["sessions", "a/b", "query"])
                .unwrap()
                .as_str(),
            "http://localhost:8080/chat/v1/sessions/a%2Fb/query"
        );
    }

    #[test]
    fn headers_carry_the_api_key() {
        let client = OnDemand::new(Some("secret".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers.get("apikey").unwrap(), "secret");
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let client = OnDemand::new(Some("bad\nkey".to_string())).unwrap();
        assert!(client.default_headers().is_err());
    }
}
