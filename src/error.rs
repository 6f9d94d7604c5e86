//! Error types for the on-demand chat client.
//!
//! Every failure the client can hit is represented by a variant of [`Error`]: bad
//! configuration, transport failures, non-success HTTP statuses, undecodable payloads and
//! broken event streams.  Each variant maps onto a process exit code through
//! [`Error::exit_code`].

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for configuration errors.
pub const EXIT_CONFIGURATION: i32 = 1;
/// Exit code when the session could not be created.
pub const EXIT_SESSION_UNAVAILABLE: i32 = 2;
/// Exit code for transport failures while querying.
pub const EXIT_TRANSPORT: i32 = 3;
/// Exit code for non-success HTTP statuses while querying.
pub const EXIT_HTTP_STATUS: i32 = 4;
/// Exit code for event streams that broke mid-read.
pub const EXIT_STREAM: i32 = 5;
/// Exit code for response bodies that could not be decoded.
pub const EXIT_DECODE: i32 = 6;
/// Exit code when the result could not be written out.
pub const EXIT_OUTPUT: i32 = 7;

/// The main error type for the chat client.
#[derive(Clone, Debug)]
pub enum Error {
    /// A non-success HTTP status without a more specific variant.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body.
        message: String,
        /// Request ID for debugging and support.
        request_id: Option<String>,
    },

    /// The API key was rejected (HTTP 401).
    Authentication {
        /// Raw response body.
        message: String,
    },

    /// The API key lacks access to the resource (HTTP 403).
    Permission {
        /// Raw response body.
        message: String,
    },

    /// Session or endpoint not found (HTTP 404).
    NotFound {
        /// Raw response body.
        message: String,
    },

    /// Rate limit exceeded (HTTP 429).
    RateLimit {
        /// Raw response body.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// The service rejected the request parameters (HTTP 400).
    BadRequest {
        /// Raw response body.
        message: String,
    },

    /// Server returned a 500 internal error.
    InternalServer {
        /// Raw response body.
        message: String,
        /// Request ID for debugging and support.
        request_id: Option<String>,
    },

    /// Server is overloaded or unavailable (HTTP 502, 503, 504).
    ServiceUnavailable {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// The request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// Connection error.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Error during JSON or YAML serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// A configuration value failed validation.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// Required configuration is missing.
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// The event stream failed while it was being read.
    Streaming {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Session creation failed, so no query can be submitted.
    SessionUnavailable {
        /// The failure reported by session creation.
        source: Box<Error>,
    },

    /// The result could not be written to its destination.
    Output {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>, request_id: Option<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
            request_id,
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>, request_id: Option<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
            request_id,
        }
    }

    /// Creates a new service unavailable error.
    pub fn service_unavailable(
        status_code: u16,
        message: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        Error::ServiceUnavailable {
            status_code,
            message: message.into(),
            retry_after,
        }
    }

    /// Map a non-success HTTP status and its raw body onto the matching variant.
    pub fn from_status(
        status_code: u16,
        body: impl Into<String>,
        request_id: Option<String>,
        retry_after: Option<u64>,
    ) -> Self {
        let body = body.into();
        match status_code {
            400 => Error::bad_request(body),
            401 => Error::authentication(body),
            403 => Error::permission(body),
            404 => Error::not_found(body),
            429 => Error::rate_limit(body, retry_after),
            500 => Error::internal_server(body, request_id),
            502..=504 => Error::service_unavailable(status_code, body, retry_after),
            _ => Error::api(status_code, body, request_id),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new streaming error.
    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Wraps a session-creation failure.
    pub fn session_unavailable(source: Error) -> Self {
        Error::SessionUnavailable {
            source: Box::new(source),
        }
    }

    /// Creates a new output error.
    pub fn output(message: impl Into<String>, source: io::Error) -> Self {
        Error::Output {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Returns true if this error stems from bad or missing configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::Validation { .. }
                | Error::Io { .. }
                | Error::Url { .. }
        )
    }

    /// Returns true if the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. } | Error::Timeout { .. } | Error::HttpClient { .. }
        )
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::InternalServer { .. } | Error::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error broke an event stream mid-read.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Error::Streaming { .. })
    }

    /// Returns true if session creation failed.
    pub fn is_session_unavailable(&self) -> bool {
        matches!(self, Error::SessionUnavailable { .. })
    }

    /// Returns true if writing the result failed.
    pub fn is_output(&self) -> bool {
        matches!(self, Error::Output { .. })
    }

    /// Returns the request ID associated with this error, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Api { request_id, .. } => request_id.as_deref(),
            Error::InternalServer { request_id, .. } => request_id.as_deref(),
            Error::SessionUnavailable { source } => source.request_id(),
            _ => None,
        }
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::BadRequest { .. } => Some(400),
            Error::Authentication { .. } => Some(401),
            Error::Permission { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::InternalServer { .. } => Some(500),
            Error::ServiceUnavailable { status_code, .. } => Some(*status_code),
            Error::SessionUnavailable { source } => source.status_code(),
            _ => None,
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_session_unavailable() {
            EXIT_SESSION_UNAVAILABLE
        } else if self.is_output() {
            EXIT_OUTPUT
        } else if self.is_configuration() {
            EXIT_CONFIGURATION
        } else if self.is_transport() {
            EXIT_TRANSPORT
        } else if self.status_code().is_some() {
            EXIT_HTTP_STATUS
        } else if self.is_streaming() {
            EXIT_STREAM
        } else {
            EXIT_DECODE
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
                request_id,
            } => {
                if let Some(request_id) = request_id {
                    write!(
                        f,
                        "API error ({status_code}): {message} (Request ID: {request_id})"
                    )
                } else {
                    write!(f, "API error ({status_code}): {message}")
                }
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error (401): {message}")
            }
            Error::Permission { message } => {
                write!(f, "Permission error (403): {message}")
            }
            Error::NotFound { message } => {
                write!(f, "Resource not found (404): {message}")
            }
            Error::RateLimit {
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Rate limit exceeded (429): {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Rate limit exceeded (429): {message}")
                }
            }
            Error::BadRequest { message } => {
                write!(f, "Bad request (400): {message}")
            }
            Error::InternalServer {
                message,
                request_id,
            } => {
                if let Some(request_id) = request_id {
                    write!(
                        f,
                        "Internal server error (500): {message} (Request ID: {request_id})"
                    )
                } else {
                    write!(f, "Internal server error (500): {message}")
                }
            }
            Error::ServiceUnavailable {
                status_code,
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Service unavailable ({status_code}): {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Service unavailable ({status_code}): {message}")
                }
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Output { message, .. } => {
                write!(f, "Output error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Configuration { message } => {
                write!(f, "Configuration error: {message}")
            }
            Error::Streaming { message, .. } => {
                write!(f, "Streaming error: {message}")
            }
            Error::SessionUnavailable { source } => {
                write!(f, "Session unavailable: {source}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Output { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            Error::Streaming { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::SessionUnavailable { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::validation(format!("YAML error: {err}"), None)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for chat client operations.
pub type Result<T> = std::result::Result<T, Error>;
