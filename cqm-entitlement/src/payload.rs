//! Opaque native payloads.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;

/// JSON text returned by the native layer on success.
///
/// The text is checked to be well-formed JSON and then kept byte for byte:
/// key order, number spelling and whitespace reach the caller exactly as the
/// native side produced them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Payload(String);

impl Payload {
    /// Wrap native JSON text. Fails if `json` is not a single JSON value.
    pub fn from_json(json: impl Into<String>) -> Result<Self, serde_json::Error> {
        let json = json.into();
        serde_json::from_str::<IgnoredAny>(&json)?;
        Ok(Self(json))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the payload into a caller-chosen type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.0)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
