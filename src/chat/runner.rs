//! The two-step chat run.
//!
//! A run creates one session and, only when that succeeds, submits one query against it.

use crate::chat::config::ChatConfig;
use crate::error::Result;
use crate::{ChatApi, Error, OnDemand, QueryOutput, Renderer};

/// Drives one session-then-query run against a [`ChatApi`].
pub struct ChatRun<A: ChatApi> {
    api: A,
    config: ChatConfig,
}

impl ChatRun<OnDemand> {
    /// Creates a run against the API described by `config`.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let api = OnDemand::with_options(
            Some(config.api_key.clone()),
            Some(config.base_url.clone()),
            config.timeout,
        )?;
        Ok(Self::with_api(api, config))
    }
}

impl<A: ChatApi> ChatRun<A> {
    /// Creates a run against a custom API implementation.
    pub fn with_api(api: A, config: ChatConfig) -> Self {
        Self { api, config }
    }

    /// Returns the configuration of this run.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the API this run talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create the session, submit the query and render the output.
    ///
    /// Any failure while creating the session is returned as
    /// [`Error::SessionUnavailable`] and the query is never submitted.  `Ok(None)` means the
    /// query was sent with a response mode that produces no output.
    pub async fn run(&self, renderer: &mut dyn Renderer) -> Result<Option<QueryOutput>> {
        let session = self
            .api
            .create_session(&self.config.session_request())
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "session creation failed; skipping query");
                Error::session_unavailable(err)
            })?;
        renderer.print_session(&session);

        renderer.print_info(&format!(
            "Submitting query '{}' (response mode: {})",
            self.config.query, self.config.response_mode
        ));
        let output = self
            .api
            .submit_query(
                session.id(),
                &self.config.query_request(),
                &self.config.context_metadata,
            )
            .await?;

        match &output {
            Some(output) => renderer.print_output(output)?,
            None => renderer.print_info(&format!(
                "Response mode '{}' produces no output",
                self.config.response_mode
            )),
        }
        Ok(output)
    }
}
