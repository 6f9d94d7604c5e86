use serde::{Deserialize, Serialize};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default nucleus sampling value.
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Model parameters sent with every query.
///
/// The client does not validate these; the service does.  A `max_tokens` of zero leaves the
/// limit to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfigs {
    /// Extra instructions for the fulfillment model.
    pub fulfillment_prompt: String,

    /// Sequences that stop generation.
    pub stop_sequences: Vec<String>,

    /// Sampling temperature.
    pub temperature: f64,

    /// Nucleus sampling value.
    pub top_p: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Presence penalty.
    pub presence_penalty: f64,

    /// Frequency penalty.
    pub frequency_penalty: f64,
}

impl ModelConfigs {
    /// Creates a new `ModelConfigs` with default values.
    pub fn new() -> Self {
        Self {
            fulfillment_prompt: String::new(),
            stop_sequences: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: 0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }

    /// Sets the fulfillment prompt.
    pub fn with_fulfillment_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.fulfillment_prompt = prompt.into();
        self
    }

    /// Sets the stop sequences.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = stop_sequences;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the presence penalty.
    pub fn with_presence_penalty(mut self, penalty: f64) -> Self {
        self.presence_penalty = penalty;
        self
    }

    /// Sets the frequency penalty.
    pub fn with_frequency_penalty(mut self, penalty: f64) -> Self {
        self.frequency_penalty = penalty;
        self
    }
}

impl Default for ModelConfigs {
    fn default() -> Self {
        Self::new()
    }
}
