//! `gateway-http` is a blocking HTTP transport for payment gateway endpoints.
//!
//! A [`GatewayClient`] resolves its [`Config`] once into
//! [`TransportOptions`] and then sends requests with:
//! - [`GatewayClient::send`]
//! - [`GatewayClient::get`]
//! - [`GatewayClient::post`]
//!
//! Refused connections are retried within a bounded budget of attempts and
//! time (see [`RetryPolicy`]); each failed attempt is reported to the
//! injected [`Logger`]. Exhausted retries surface as
//! [`GatewayError::BadResult`].

mod builder;
mod client;
mod clock;
mod code;
mod config;
mod diagnostics;
mod error;
mod handle;
mod info;
mod logger;
mod options;
mod retry;
mod transport;

pub use builder::{TransportOptionsBuilder, AUTH_BASIC};
pub use client::GatewayClient;
pub use clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use code::ErrorCode;
pub use config::Config;
pub use diagnostics::DiagnosticLog;
pub use error::{ErrorKind, GatewayError};
pub use handle::TransportHandle;
pub use info::{InfoKey, InfoValue, ResponseInfo};
pub use logger::{Logger, TracingLogger};
pub use options::{OptionSet, OptionValue, TransportOption, TransportOptions};
pub use retry::{AttemptOutcome, RetryController, RetryPolicy};
pub use transport::{RawResponse, ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, GatewayError>;
