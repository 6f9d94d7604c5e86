use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A key/value pair of context metadata.
///
/// The service stores these alongside a session, and the client echoes the caller's pairs
/// back next to every answer it prints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextField {
    /// The metadata key.
    pub key: String,

    /// The metadata value.
    pub value: String,
}

impl ContextField {
    /// Create a new `ContextField`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a comma-separated list of `key=value` entries.
    ///
    /// Empty entries are ignored, so a trailing comma is harmless.
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

impl std::str::FromStr for ContextField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((key, value)) = s.split_once('=') else {
            return Err(Error::validation(
                format!("context entry '{s}' is not of the form key=value"),
                Some("context".to_string()),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(
                format!("context entry '{s}' has an empty key"),
                Some("context".to_string()),
            ));
        }
        Ok(Self::new(key, value.trim()))
    }
}
