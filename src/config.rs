use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{GatewayError, Result};

/// Caller-supplied configuration mapping.
///
/// Keys are the recognised option names (`url`, `user_agent`,
/// `ssl_verify_peer`, `connect_attempts`, `curl_options`, ...). Unknown keys
/// are ignored. Insertion order is preserved, which matters for the
/// `curl_options` override mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(Map<String, JsonValue>);

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Wraps a JSON object.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(GatewayError::Config(format!(
                "configuration must be an object, got {other}"
            ))),
        }
    }

    /// Parses a JSON document holding the configuration object.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| GatewayError::Config(format!("invalid configuration JSON: {err}")))
    }

    /// Value for `key`; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Value for `key` when it is present and not empty.
    ///
    /// Empty means `null`, `""`, `[]` or `{}`. Zero and `false` are values.
    pub fn non_empty(&self, key: &str) -> Option<&JsonValue> {
        self.get(key).filter(|value| match value {
            JsonValue::String(text) => !text.is_empty(),
            JsonValue::Array(items) => !items.is_empty(),
            JsonValue::Object(map) => !map.is_empty(),
            _ => true,
        })
    }

    /// Nested object under `key`, in insertion order.
    pub fn object(&self, key: &str) -> Option<&Map<String, JsonValue>> {
        self.get(key).and_then(JsonValue::as_object)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl TryFrom<JsonValue> for Config {
    type Error = GatewayError;

    fn try_from(value: JsonValue) -> Result<Self> {
        Self::from_value(value)
    }
}

impl<K, V> FromIterator<(K, V)> for Config
where
    K: Into<String>,
    V: Into<JsonValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}
