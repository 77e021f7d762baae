use std::error::Error as StdError;
use std::fmt;

/// Transport-level error code reported for a single attempt.
///
/// Numbering follows libcurl's `CURLcode` so codes stay comparable with
/// gateway logs produced by other integrations. `0` means no error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const OK: Self = Self(0);
    pub const UNSUPPORTED_PROTOCOL: Self = Self(1);
    pub const FAILED_INIT: Self = Self(2);
    pub const URL_MALFORMAT: Self = Self(3);
    pub const COULDNT_RESOLVE_PROXY: Self = Self(5);
    pub const COULDNT_RESOLVE_HOST: Self = Self(6);
    pub const COULDNT_CONNECT: Self = Self(7);
    pub const OPERATION_TIMEDOUT: Self = Self(28);
    pub const SSL_CONNECT_ERROR: Self = Self(35);
    pub const TOO_MANY_REDIRECTS: Self = Self(47);
    pub const SEND_ERROR: Self = Self(55);
    pub const RECV_ERROR: Self = Self(56);
    pub const BAD_CONTENT_ENCODING: Self = Self(61);

    /// Returns `true` for the zero code.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Decides whether a failed attempt with this code may be repeated.
    ///
    /// Only a refused or unreachable connection qualifies; the request never
    /// left the client. Timeouts, resolution and TLS failures are fatal.
    pub fn is_retryable(self) -> bool {
        self == Self::COULDNT_CONNECT
    }

    /// Short human-readable description of the code.
    pub fn description(self) -> &'static str {
        match self {
            Self::OK => "no error",
            Self::UNSUPPORTED_PROTOCOL => "unsupported protocol",
            Self::FAILED_INIT => "failed to initialise request",
            Self::URL_MALFORMAT => "malformed URL",
            Self::COULDNT_RESOLVE_PROXY => "couldn't resolve proxy",
            Self::COULDNT_RESOLVE_HOST => "couldn't resolve host",
            Self::COULDNT_CONNECT => "couldn't connect to server",
            Self::OPERATION_TIMEDOUT => "operation timed out",
            Self::SSL_CONNECT_ERROR => "TLS handshake failed",
            Self::TOO_MANY_REDIRECTS => "too many redirects",
            Self::SEND_ERROR => "failed sending data",
            Self::RECV_ERROR => "failure receiving data",
            Self::BAD_CONTENT_ENCODING => "unrecognised content encoding",
            _ => "unknown transport error",
        }
    }

    /// Maps a `reqwest` failure onto a transport error code.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::URL_MALFORMAT;
        }
        // Connect timeouts report both flags; the timeout wins.
        if err.is_timeout() {
            return Self::OPERATION_TIMEDOUT;
        }
        if err.is_connect() {
            return classify_connect_failure(err);
        }
        if err.is_redirect() {
            return Self::TOO_MANY_REDIRECTS;
        }
        if err.is_decode() {
            return Self::BAD_CONTENT_ENCODING;
        }
        if err.is_body() {
            return Self::RECV_ERROR;
        }
        if err.is_request() {
            return Self::SEND_ERROR;
        }
        Self::FAILED_INIT
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

fn classify_connect_failure(err: &reqwest::Error) -> ErrorCode {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return ErrorCode::COULDNT_RESOLVE_HOST;
        }
        if text.contains("certificate") || text.contains("handshake") || text.contains("tls") {
            return ErrorCode::SSL_CONNECT_ERROR;
        }
        source = cause.source();
    }
    ErrorCode::COULDNT_CONNECT
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn only_connection_failures_are_retryable() {
        assert!(ErrorCode::COULDNT_CONNECT.is_retryable());
        for code in [
            ErrorCode::OK,
            ErrorCode::URL_MALFORMAT,
            ErrorCode::COULDNT_RESOLVE_HOST,
            ErrorCode::OPERATION_TIMEDOUT,
            ErrorCode::SSL_CONNECT_ERROR,
            ErrorCode(999),
        ] {
            assert!(!code.is_retryable(), "{code} must be fatal");
        }
    }

    #[test]
    fn displays_as_bare_number() {
        assert_eq!(ErrorCode::COULDNT_CONNECT.to_string(), "7");
        assert_eq!(ErrorCode::default().to_string(), "0");
    }

    #[test]
    fn unknown_codes_have_generic_description() {
        assert_eq!(ErrorCode(4242).description(), "unknown transport error");
        assert_eq!(ErrorCode::OPERATION_TIMEDOUT.description(), "operation timed out");
    }

    #[test]
    fn invalid_url_maps_to_malformed() {
        let err = reqwest::blocking::Client::new()
            .get("not a url")
            .send()
            .expect_err("relative URL must not be sendable");
        assert_eq!(ErrorCode::from_reqwest(&err), ErrorCode::URL_MALFORMAT);
    }
}
