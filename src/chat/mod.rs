//! The command-line chat run.
//!
//! - [`config`]: CLI argument parsing, the YAML configuration file and [`ChatConfig`]
//! - [`runner`]: the session-then-query run against a [`ChatApi`](crate::ChatApi)

mod config;
mod runner;

pub use config::{
    BASE_URL_ENV, ChatArgs, ChatConfig, ChatFile, DEFAULT_AGENT_IDS, DEFAULT_ENDPOINT_ID,
    DEFAULT_REASONING_MODE, EXTERNAL_USER_ID_ENV, EXTERNAL_USER_ID_PLACEHOLDER,
};
pub use runner::ChatRun;
