use std::time::Duration;

use crate::{Config, OptionSet, OptionValue, RetryPolicy, TransportOption, TransportOptions};

const DEFAULT_SSL_VERIFY_PEER: i64 = 2;
const DEFAULT_CONNECT_TIMEOUT_SECS: i64 = 5;
const DEFAULT_TIMEOUT_SECS: i64 = 60;
const DEFAULT_CONNECT_ATTEMPTS_TIMEOUT_SECS: f64 = 20.0;
const DEFAULT_SLEEP: Duration = Duration::from_secs(1);

/// Auth scheme value applied to [`TransportOption::HttpAuth`].
pub const AUTH_BASIC: &str = "basic";

/// Resolves a [`Config`] into [`TransportOptions`].
///
/// Resolution is pure: no I/O, no clock reads. The order of applications is
/// fixed; the `curl_options` override mapping always comes last so it can
/// replace any default or derived value.
#[derive(Clone, Copy, Debug)]
pub struct TransportOptionsBuilder<'a> {
    config: &'a Config,
}

impl<'a> TransportOptionsBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn build(&self) -> TransportOptions {
        let mut settings = OptionSet::new();
        self.apply_defaults(&mut settings);
        self.apply_optional(&mut settings);
        self.apply_basic_auth(&mut settings);
        self.apply_overrides(&mut settings);
        let retry = self.retry_policy(&settings);
        TransportOptions::new(settings, retry)
    }

    fn apply_defaults(&self, settings: &mut OptionSet) {
        settings.set(TransportOption::FollowLocation, true);
        settings.set(TransportOption::Url, self.value_or("url", ""));
        settings.set(TransportOption::UserAgent, self.value_or("user_agent", ""));
        settings.set(
            TransportOption::SslVerifyPeer,
            self.value_or("ssl_verify_peer", DEFAULT_SSL_VERIFY_PEER),
        );
        settings.set(
            TransportOption::SslVerifyHost,
            self.value_or("ssl_verify_host", true),
        );
        settings.set(
            TransportOption::ConnectTimeout,
            self.value_or("connect_timeout", DEFAULT_CONNECT_TIMEOUT_SECS),
        );
        settings.set(
            TransportOption::Timeout,
            self.value_or("timeout", DEFAULT_TIMEOUT_SECS),
        );
        let headers = self
            .value("http_headers")
            .map(|value| value.as_list())
            .unwrap_or_default();
        settings.set(TransportOption::HttpHeader, headers);
        settings.set(TransportOption::Verbose, true);
        settings.set(TransportOption::ReturnTransfer, true);
    }

    fn apply_optional(&self, settings: &mut OptionSet) {
        for (key, option) in [
            ("ssl_cacertfile", TransportOption::CaInfo),
            ("proxy_host", TransportOption::Proxy),
            ("proxy_port", TransportOption::ProxyPort),
        ] {
            if let Some(value) = self.config.non_empty(key) {
                settings.set(option, OptionValue::from(value));
            }
        }
    }

    fn apply_basic_auth(&self, settings: &mut OptionSet) {
        let username = self.config.non_empty("username").map(OptionValue::from);
        let password = self.config.non_empty("password").map(OptionValue::from);
        if let (Some(username), Some(password)) = (username, password) {
            settings.set(TransportOption::HttpAuth, AUTH_BASIC);
            settings.set(
                TransportOption::UserPwd,
                format!("{}:{}", username.as_text(), password.as_text()),
            );
        }
    }

    fn apply_overrides(&self, settings: &mut OptionSet) {
        let Some(overrides) = self.config.object("curl_options") else {
            return;
        };
        for (key, value) in overrides {
            settings.set(TransportOption::from_key(key), OptionValue::from(value));
        }
    }

    /// Retry bounds. The connect timeout is read from the resolved settings
    /// so an override of it also governs the budget check.
    fn retry_policy(&self, settings: &OptionSet) -> RetryPolicy {
        let max_attempts = self
            .number("connect_attempts")
            .map(|count| count.max(1.0).min(f64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let sleep = match (self.number("sleep_seconds"), self.number("sleep_useconds")) {
            (None, None) => DEFAULT_SLEEP,
            (seconds, micros) => {
                secs_to_duration(seconds.unwrap_or_default())
                    .saturating_add(micros_to_duration(micros.unwrap_or_default()))
            }
        };

        RetryPolicy {
            max_attempts,
            connect_timeout: secs_to_duration(
                settings
                    .get(&TransportOption::ConnectTimeout)
                    .and_then(OptionValue::as_secs)
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS as f64),
            ),
            connect_attempts_timeout: secs_to_duration(
                self.number("connect_attempts_timeout")
                    .unwrap_or(DEFAULT_CONNECT_ATTEMPTS_TIMEOUT_SECS),
            ),
            sleep,
        }
    }

    fn value(&self, key: &str) -> Option<OptionValue> {
        self.config.get(key).map(OptionValue::from)
    }

    fn value_or(&self, key: &str, default: impl Into<OptionValue>) -> OptionValue {
        self.value(key).unwrap_or_else(|| default.into())
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|value| value.as_secs())
    }
}

fn secs_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

fn micros_to_duration(micros: f64) -> Duration {
    if micros.is_nan() || micros <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros(micros.round().min(u64::MAX as f64) as u64)
}
