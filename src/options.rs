use std::fmt;

use serde_json::Value as JsonValue;

use crate::RetryPolicy;

/// Key of a single transport setting.
///
/// Names mirror the transport settings a gateway integration is expected to
/// tune; [`TransportOption::Other`] preserves keys this crate does not know
/// so the transport layer can reject them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportOption {
    FollowLocation,
    MaxRedirs,
    Url,
    UserAgent,
    SslVerifyPeer,
    SslVerifyHost,
    ConnectTimeout,
    Timeout,
    HttpHeader,
    Verbose,
    ReturnTransfer,
    CaInfo,
    Proxy,
    ProxyPort,
    HttpAuth,
    UserPwd,
    CustomRequest,
    Post,
    PostFields,
    Other(String),
}

impl TransportOption {
    /// Parses an override key. Matching is case-insensitive and accepts an
    /// optional `curlopt_` prefix.
    pub fn from_key(key: &str) -> Self {
        let normalized = key.trim().to_ascii_lowercase();
        let name = normalized.strip_prefix("curlopt_").unwrap_or(&normalized);
        match name {
            "followlocation" => Self::FollowLocation,
            "maxredirs" => Self::MaxRedirs,
            "url" => Self::Url,
            "useragent" | "user_agent" => Self::UserAgent,
            "ssl_verifypeer" => Self::SslVerifyPeer,
            "ssl_verifyhost" => Self::SslVerifyHost,
            "connecttimeout" | "connect_timeout" => Self::ConnectTimeout,
            "timeout" => Self::Timeout,
            "httpheader" => Self::HttpHeader,
            "verbose" => Self::Verbose,
            "returntransfer" => Self::ReturnTransfer,
            "cainfo" => Self::CaInfo,
            "proxy" => Self::Proxy,
            "proxyport" => Self::ProxyPort,
            "httpauth" => Self::HttpAuth,
            "userpwd" => Self::UserPwd,
            "customrequest" => Self::CustomRequest,
            "post" => Self::Post,
            "postfields" => Self::PostFields,
            _ => Self::Other(name.to_owned()),
        }
    }

    /// Canonical key, the inverse of [`TransportOption::from_key`].
    pub fn key(&self) -> &str {
        match self {
            Self::FollowLocation => "followlocation",
            Self::MaxRedirs => "maxredirs",
            Self::Url => "url",
            Self::UserAgent => "useragent",
            Self::SslVerifyPeer => "ssl_verifypeer",
            Self::SslVerifyHost => "ssl_verifyhost",
            Self::ConnectTimeout => "connecttimeout",
            Self::Timeout => "timeout",
            Self::HttpHeader => "httpheader",
            Self::Verbose => "verbose",
            Self::ReturnTransfer => "returntransfer",
            Self::CaInfo => "cainfo",
            Self::Proxy => "proxy",
            Self::ProxyPort => "proxyport",
            Self::HttpAuth => "httpauth",
            Self::UserPwd => "userpwd",
            Self::CustomRequest => "customrequest",
            Self::Post => "post",
            Self::PostFields => "postfields",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for TransportOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value applied to a [`TransportOption`].
///
/// Values are kept as supplied: a falsy `ssl_verify_peer` stays `false`
/// and is not coerced to `0`.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    /// Loose truthiness used for flag-like options: `false`, zero, `""`,
    /// `"0"` and empty lists are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::Int(number) => *number != 0,
            Self::Float(number) => *number != 0.0,
            Self::Text(text) => !text.is_empty() && text != "0",
            Self::List(items) => !items.is_empty(),
        }
    }

    /// String rendering used for URL-, path- and credential-like options.
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(true) => "1".to_owned(),
            Self::Bool(false) => String::new(),
            Self::Int(number) => number.to_string(),
            Self::Float(number) => number.to_string(),
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join(","),
        }
    }

    /// Numeric reading in seconds, accepting numeric strings.
    pub fn as_secs(&self) -> Option<f64> {
        match self {
            Self::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Self::Int(number) => Some(*number as f64),
            Self::Float(number) => Some(*number),
            Self::Text(text) => text.trim().parse().ok(),
            Self::List(_) => None,
        }
    }

    /// List reading; a single text value becomes a one-element list.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(text) if !text.is_empty() => vec![text.clone()],
            _ => Vec::new(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&JsonValue> for OptionValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Bool(false),
            JsonValue::Bool(flag) => Self::Bool(*flag),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => Self::Int(int),
                None => Self::Float(number.as_f64().unwrap_or_default()),
            },
            JsonValue::String(text) => Self::Text(text.clone()),
            JsonValue::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            JsonValue::Object(_) => Self::Text(value.to_string()),
        }
    }
}

/// Ordered record of option applications.
///
/// Every [`OptionSet::set`] call is kept. Reads return the last value
/// applied for a key, so later applications override earlier ones while the
/// full history stays inspectable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(TransportOption, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one application of `option`.
    pub fn set(&mut self, option: TransportOption, value: impl Into<OptionValue>) {
        self.entries.push((option, value.into()));
    }

    /// Appends every application from `other`, preserving order.
    pub fn extend_from(&mut self, other: &OptionSet) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Effective value: the last one applied.
    pub fn get(&self, option: &TransportOption) -> Option<&OptionValue> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key == option)
            .map(|(_, value)| value)
    }

    pub fn is_set(&self, option: &TransportOption) -> bool {
        self.get(option).is_some()
    }

    /// Number of times `option` was applied.
    pub fn count(&self, option: &TransportOption) -> usize {
        self.entries.iter().filter(|(key, _)| key == option).count()
    }

    /// Every value applied for `option`, oldest first.
    pub fn values(&self, option: &TransportOption) -> Vec<&OptionValue> {
        self.entries
            .iter()
            .filter(|(key, _)| key == option)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn text(&self, option: &TransportOption) -> Option<String> {
        self.get(option).map(OptionValue::as_text)
    }

    pub fn flag(&self, option: &TransportOption) -> Option<bool> {
        self.get(option).map(OptionValue::is_truthy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(TransportOption, OptionValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fully resolved client configuration.
///
/// Produced once per client by [`crate::TransportOptionsBuilder`] and never
/// modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportOptions {
    settings: OptionSet,
    retry: RetryPolicy,
}

impl TransportOptions {
    pub fn new(settings: OptionSet, retry: RetryPolicy) -> Self {
        Self { settings, retry }
    }

    pub fn settings(&self) -> &OptionSet {
        &self.settings
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Effective target URL, empty when none was configured.
    pub fn url(&self) -> String {
        self.settings.text(&TransportOption::Url).unwrap_or_default()
    }
}
