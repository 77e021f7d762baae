use std::fmt;
use std::io::{self, Write};

use crate::{
    AttemptOutcome, DiagnosticLog, OptionSet, OptionValue, RawResponse, ResponseInfo, Transport,
    TransportOption, TransportOptions,
};

/// Client-owned transport state.
///
/// Holds the resolved client-wide options, the request-level options of the
/// request in flight, the diagnostic log and the last response. Dropping the
/// handle releases all of it.
pub struct TransportHandle {
    transport: Box<dyn Transport>,
    base: OptionSet,
    request: OptionSet,
    diagnostics: DiagnosticLog,
    info: ResponseInfo,
    body: Vec<u8>,
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("request", &self.request)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl TransportHandle {
    pub fn new(options: &TransportOptions, transport: Box<dyn Transport>) -> Self {
        let base = options.settings().clone();
        let verbose = base.flag(&TransportOption::Verbose).unwrap_or(false);
        Self {
            transport,
            base,
            request: OptionSet::new(),
            diagnostics: DiagnosticLog::new(verbose),
            info: ResponseInfo::default(),
            body: Vec::new(),
        }
    }

    /// Drops request-level options and everything the previous request
    /// left behind: diagnostics, response metadata and body.
    pub fn reset(&mut self) {
        self.request = OptionSet::new();
        self.diagnostics.clear();
        self.clear_response();
    }

    fn clear_response(&mut self) {
        self.info = ResponseInfo::default();
        self.body.clear();
    }

    /// Applies a request-level option.
    pub fn set(&mut self, option: TransportOption, value: impl Into<OptionValue>) {
        self.request.set(option, value);
    }

    /// Every option in effect for the next attempt, client-wide first.
    pub fn applied(&self) -> OptionSet {
        let mut applied = self.base.clone();
        applied.extend_from(&self.request);
        applied
    }

    /// Performs exactly one attempt.
    pub fn exec(&mut self) -> AttemptOutcome {
        let applied = self.applied();
        match self.transport.perform(&applied, &mut self.diagnostics) {
            Ok(RawResponse { info, body }) => {
                tracing::debug!(
                    status = info.status,
                    bytes = body.len(),
                    "gateway request completed"
                );
                self.info = info;
                self.body = if applied.flag(&TransportOption::ReturnTransfer).unwrap_or(true) {
                    body
                } else {
                    write_uncaptured(io::stdout().lock(), &body);
                    Vec::new()
                };
                AttemptOutcome::succeeded()
            }
            Err(code) => {
                tracing::debug!(code = code.0, "gateway request failed: {}", code.description());
                self.clear_response();
                AttemptOutcome::failed(code)
            }
        }
    }

    pub fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }

    pub fn info(&self) -> &ResponseInfo {
        &self.info
    }

    pub fn log_data(&self) -> &str {
        self.diagnostics.as_str()
    }
}

/// Writes a body that is not captured. A failed write is reported through
/// `tracing` and leaves the attempt's outcome untouched.
fn write_uncaptured(mut out: impl Write, body: &[u8]) {
    if let Err(err) = out.write_all(body).and_then(|()| out.flush()) {
        tracing::warn!(bytes = body.len(), "failed to write uncaptured response body: {err}");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Write};

    use super::{write_uncaptured, TransportHandle};
    use crate::{
        AttemptOutcome, Config, DiagnosticLog, ErrorCode, OptionSet, RawResponse, ResponseInfo,
        Transport, TransportOption, TransportOptionsBuilder,
    };

    struct Scripted(VecDeque<Result<RawResponse, ErrorCode>>);

    impl Transport for Scripted {
        fn perform(
            &mut self,
            _request: &OptionSet,
            diagnostics: &mut DiagnosticLog,
        ) -> Result<RawResponse, ErrorCode> {
            diagnostics.info("scripted attempt");
            self.0.pop_front().unwrap_or(Err(ErrorCode::FAILED_INIT))
        }
    }

    fn scripted_handle(
        config: Config,
        script: Vec<Result<RawResponse, ErrorCode>>,
    ) -> TransportHandle {
        let options = TransportOptionsBuilder::new(&config).build();
        TransportHandle::new(&options, Box::new(Scripted(script.into())))
    }

    fn ok(status: u16, body: &str) -> Result<RawResponse, ErrorCode> {
        Ok(RawResponse {
            info: ResponseInfo {
                status,
                ..ResponseInfo::default()
            },
            body: body.as_bytes().to_vec(),
        })
    }

    #[test]
    fn exec_reports_success_and_stores_response() {
        let mut handle = scripted_handle(Config::new(), vec![ok(200, "<response/>")]);
        assert_eq!(handle.exec(), AttemptOutcome::succeeded());
        assert_eq!(handle.info().status, 200);
        assert_eq!(handle.take_body(), b"<response/>");
        assert!(handle.take_body().is_empty());
    }

    #[test]
    fn exec_passes_error_code_through() {
        let mut handle = scripted_handle(Config::new(), vec![Err(ErrorCode::COULDNT_CONNECT)]);
        assert_eq!(handle.exec(), AttemptOutcome::failed(ErrorCode::COULDNT_CONNECT));
        assert_eq!(handle.info().status, 0);
    }

    #[test]
    fn request_options_follow_client_options_and_reset() {
        let config = Config::new().with("url", "http://gateway");
        let mut handle = scripted_handle(config, Vec::new());
        handle.set(TransportOption::CustomRequest, "PATCH");

        let applied = handle.applied();
        assert_eq!(applied.count(&TransportOption::Url), 1);
        assert_eq!(
            applied.text(&TransportOption::CustomRequest),
            Some("PATCH".to_owned())
        );

        handle.reset();
        assert!(!handle.applied().is_set(&TransportOption::CustomRequest));
    }

    #[test]
    fn diagnostics_are_captured_and_cleared() {
        let mut handle = scripted_handle(Config::new(), vec![ok(204, "")]);
        handle.exec();
        assert_eq!(handle.log_data(), "* scripted attempt\n");
        handle.reset();
        assert_eq!(handle.log_data(), "");
    }

    #[test]
    fn disabled_capture_discards_body() {
        let config = Config::new().with(
            "curl_options",
            serde_json::json!({ "returntransfer": false }),
        );
        let mut handle = scripted_handle(config, vec![ok(200, "")]);
        assert!(handle.exec().success);
        assert!(handle.take_body().is_empty());
    }

    #[test]
    fn failed_attempt_clears_previous_response() {
        let mut handle = scripted_handle(
            Config::new(),
            vec![ok(200, "<response/>"), Err(ErrorCode::COULDNT_CONNECT)],
        );
        assert!(handle.exec().success);
        assert_eq!(handle.info().status, 200);

        assert_eq!(handle.exec(), AttemptOutcome::failed(ErrorCode::COULDNT_CONNECT));
        assert_eq!(handle.info(), &ResponseInfo::default());
        assert!(handle.take_body().is_empty());
    }

    #[test]
    fn reset_clears_previous_response() {
        let mut handle = scripted_handle(Config::new(), vec![ok(200, "<response/>")]);
        handle.exec();
        handle.reset();
        assert_eq!(handle.info().status, 0);
        assert!(handle.take_body().is_empty());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test_log::test]
    fn uncaptured_write_failure_is_reported_not_raised() {
        write_uncaptured(BrokenPipe, b"<response/>");

        let mut captured = Vec::new();
        write_uncaptured(&mut captured, b"<response/>");
        assert_eq!(captured, b"<response/>");
    }
}
