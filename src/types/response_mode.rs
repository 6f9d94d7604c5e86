use std::fmt;

use serde::{Deserialize, Serialize};

/// How the service delivers the answer to a query.
///
/// The service defines `sync` and `stream`.  Any other value is carried through verbatim so
/// the service can validate it; the client produces no output for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseMode {
    /// One buffered JSON document.
    #[default]
    Sync,

    /// An incremental server-sent event stream.
    Stream,

    /// A mode this client does not know how to read.
    Custom(String),
}

impl ResponseMode {
    /// The wire form of this mode.
    pub fn as_str(&self) -> &str {
        match self {
            ResponseMode::Sync => "sync",
            ResponseMode::Stream => "stream",
            ResponseMode::Custom(mode) => mode,
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ResponseMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sync" => ResponseMode::Sync,
            "stream" => ResponseMode::Stream,
            _ => ResponseMode::Custom(s),
        }
    }
}

impl From<&str> for ResponseMode {
    fn from(s: &str) -> Self {
        ResponseMode::from(s.to_string())
    }
}

impl From<ResponseMode> for String {
    fn from(mode: ResponseMode) -> Self {
        match mode {
            ResponseMode::Custom(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for ResponseMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResponseMode::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn known_modes() {
        assert_eq!("sync".parse::<ResponseMode>().unwrap(), ResponseMode::Sync);
        assert_eq!("stream".parse::<ResponseMode>().unwrap(), ResponseMode::Stream);
        assert_eq!(to_value(ResponseMode::Stream).unwrap(), json!("stream"));
    }

    #[test]
    fn custom_mode_round_trips() {
        let mode: ResponseMode = serde_json::from_value(json!("webhook")).unwrap();
        assert_eq!(mode, ResponseMode::Custom("webhook".to_string()));
        assert_eq!(to_value(&mode).unwrap(), json!("webhook"));
        assert_eq!(mode.to_string(), "webhook");
    }

    #[test]
    fn modes_are_case_sensitive() {
        assert_eq!(
            ResponseMode::from("SYNC"),
            ResponseMode::Custom("SYNC".to_string())
        );
    }
}
