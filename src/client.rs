use std::fmt;
use std::sync::Arc;

use crate::{
    AttemptOutcome, Clock, Config, GatewayError, InfoKey, InfoValue, Logger, OptionSet,
    ReqwestTransport, Result, RetryController, Sleeper, SystemClock, ThreadSleeper, Transport,
    TransportHandle, TransportOption, TransportOptions, TransportOptionsBuilder,
};

/// Blocking HTTP client for a payment gateway endpoint.
///
/// Options are resolved once at construction. Each request runs the retry
/// loop, so a refused connection is retried within the configured budget
/// and every failed attempt is reported to the injected [`Logger`].
pub struct GatewayClient {
    logger: Arc<dyn Logger>,
    options: TransportOptions,
    handle: TransportHandle,
    clock: Box<dyn Clock>,
    sleeper: Box<dyn Sleeper>,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credentials = if self.options.settings().is_set(&TransportOption::UserPwd) {
            "<redacted>"
        } else {
            "<none>"
        };
        f.debug_struct("GatewayClient")
            .field("url", &self.options.url())
            .field("credentials", &credentials)
            .field("retry_policy", self.options.retry_policy())
            .finish()
    }
}

impl GatewayClient {
    /// Creates a client sending through `reqwest`.
    ///
    /// Fails when an option cannot be applied to the transport, for example
    /// an unknown `curl_options` key or an unreadable CA file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use gateway_http::{Config, GatewayClient, TracingLogger};
    ///
    /// let config = Config::new()
    ///     .with("url", "https://gateway.example/process")
    ///     .with("connect_attempts", 3);
    /// let mut client = GatewayClient::new(Arc::new(TracingLogger), config)?;
    /// let body = client.post(Some("<request/>"))?;
    /// println!("{} -> {}", client.response_code(), String::from_utf8_lossy(&body));
    /// # Ok::<(), gateway_http::GatewayError>(())
    /// ```
    pub fn new(logger: Arc<dyn Logger>, config: Config) -> Result<Self> {
        let options = TransportOptionsBuilder::new(&config).build();
        let transport = ReqwestTransport::new(options.settings())?;
        Ok(Self::assemble(logger, options, Box::new(transport)))
    }

    /// Creates a client sending through a caller-supplied [`Transport`].
    pub fn with_transport<T>(logger: Arc<dyn Logger>, config: Config, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let options = TransportOptionsBuilder::new(&config).build();
        Self::assemble(logger, options, Box::new(transport))
    }

    fn assemble(
        logger: Arc<dyn Logger>,
        options: TransportOptions,
        transport: Box<dyn Transport>,
    ) -> Self {
        let handle = TransportHandle::new(&options, transport);
        Self {
            logger,
            options,
            handle,
            clock: Box::new(SystemClock::new()),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Replaces the time source used for the retry budget.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the pause between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Sends a request with a custom method and optional payload.
    ///
    /// Without a body no payload option is applied at all.
    pub fn send(&mut self, method: &str, body: Option<&str>) -> Result<Vec<u8>> {
        self.handle.reset();
        self.handle.set(TransportOption::CustomRequest, method);
        if let Some(body) = body {
            self.handle.set(TransportOption::PostFields, body);
        }
        self.perform()
    }

    /// Sends a GET request.
    pub fn get(&mut self) -> Result<Vec<u8>> {
        self.handle.reset();
        self.perform()
    }

    /// Sends a POST request. A missing body is sent as an empty payload.
    pub fn post(&mut self, body: Option<&str>) -> Result<Vec<u8>> {
        self.handle.reset();
        self.handle.set(TransportOption::Post, true);
        self.handle.set(TransportOption::PostFields, body.unwrap_or_default());
        self.perform()
    }

    /// Fails with [`GatewayError::BadResult`] unless `outcome` succeeded.
    pub fn check_result(&self, outcome: AttemptOutcome) -> Result<&Self> {
        if outcome.success {
            Ok(self)
        } else {
            Err(GatewayError::BadResult {
                code: outcome.error_code,
            })
        }
    }

    /// HTTP status of the last response, `0` before any response.
    pub fn response_code(&self) -> u16 {
        self.handle.info().status
    }

    pub fn info(&self, key: InfoKey) -> Option<InfoValue> {
        self.handle.info().get(key)
    }

    /// Verbose transcript of the most recent request.
    pub fn log_data(&self) -> &str {
        self.handle.log_data()
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Options applied for the most recent request.
    pub fn applied_options(&self) -> OptionSet {
        self.handle.applied()
    }

    fn perform(&mut self) -> Result<Vec<u8>> {
        let outcome = self.send_and_receive_with_retries();
        self.check_result(outcome)?;
        Ok(self.handle.take_body())
    }

    fn send_and_receive_with_retries(&mut self) -> AttemptOutcome {
        let url = self.options.url();
        let handle = &mut self.handle;
        let controller = RetryController::new(
            self.options.retry_policy(),
            &url,
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            self.logger.as_ref(),
        );
        controller.run(|| handle.exec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::GatewayClient;
    use crate::{
        AttemptOutcome, Config, DiagnosticLog, ErrorCode, ErrorKind, OptionSet, RawResponse,
        Transport, TracingLogger,
    };

    struct Refusing;

    impl Transport for Refusing {
        fn perform(
            &mut self,
            _request: &OptionSet,
            _diagnostics: &mut DiagnosticLog,
        ) -> Result<RawResponse, ErrorCode> {
            Err(ErrorCode::COULDNT_CONNECT)
        }
    }

    fn refusing_client(config: Config) -> GatewayClient {
        GatewayClient::with_transport(Arc::new(TracingLogger), config, Refusing)
    }

    #[test]
    fn check_result_fails_with_bad_result() {
        let client = refusing_client(Config::new());
        let err = client
            .check_result(AttemptOutcome::failed(ErrorCode::COULDNT_CONNECT))
            .expect_err("failed outcome must be rejected");
        assert_eq!(err.kind(), ErrorKind::BadResult);
        assert_eq!(err.code(), Some(ErrorCode::COULDNT_CONNECT));
    }

    #[test]
    fn check_result_returns_same_client() {
        let client = refusing_client(Config::new());
        let returned = client
            .check_result(AttemptOutcome::succeeded())
            .expect("successful outcome");
        assert!(std::ptr::eq(returned, &client));
    }

    #[test]
    fn debug_redacts_credentials() {
        let client = refusing_client(
            Config::new()
                .with("username", "merchant")
                .with("password", "secret-password"),
        );
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-password"));
    }

    #[test]
    fn unset_attempt_count_makes_a_single_attempt() {
        let mut client = refusing_client(Config::new().with("url", "http://gateway"));
        let err = client.get().expect_err("refused connection");
        assert_eq!(err.code(), Some(ErrorCode::COULDNT_CONNECT));
        assert_eq!(client.response_code(), 0);
    }

    #[test]
    fn client_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<GatewayClient>();
    }
}
