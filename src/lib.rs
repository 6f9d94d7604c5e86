// Public modules
pub mod accumulator;
pub mod chat;
pub mod client;
pub mod error;
pub mod logging;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use accumulator::{StreamAccumulator, StreamState, consume_stream};
pub use client::{ChatApi, OnDemand};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use sse::{StreamRecord, process_event_stream};
pub use types::*;
