// Public modules
pub mod context_field;
pub mod final_result;
pub mod model_configs;
pub mod query_output;
pub mod query_request;
pub mod response_mode;
pub mod session;
pub mod stream_event;
pub mod sync_response;

mod lenient;

// Re-exports
pub use context_field::ContextField;
pub use final_result::{FINAL_RESULT_MESSAGE, FINAL_RESULT_STATUS, FinalResult, FinalResultData};
pub use model_configs::{DEFAULT_TEMPERATURE, DEFAULT_TOP_P, ModelConfigs};
pub use query_output::QueryOutput;
pub use query_request::QueryRequest;
pub use response_mode::ResponseMode;
pub use session::{CreateSessionRequest, CreateSessionResponse, Session, SessionData};
pub use stream_event::{FulfillmentEvent, MetricsLogEvent, StreamEvent};
pub use sync_response::SyncResponse;
