use crate::ErrorCode;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request produced no usable result: retries were exhausted or the
    /// transport failed with a fatal code.
    #[error("bad result: {} (transport error {})", .code.description(), .code)]
    BadResult {
        /// Code reported by the last attempt.
        code: ErrorCode,
    },
    /// An option value could not be applied to the transport.
    #[error("invalid transport option: {0}")]
    Config(String),
    /// `reqwest` refused the resolved client configuration.
    #[error("transport setup error: {0}")]
    Transport(reqwest::Error),
}

/// Coarse classification of [`GatewayError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    BadResult,
    Config,
    Transport,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadResult { .. } => ErrorKind::BadResult,
            Self::Config(_) => ErrorKind::Config,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Transport error code carried by a [`GatewayError::BadResult`].
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::BadResult { code } => Some(*code),
            _ => None,
        }
    }
}
