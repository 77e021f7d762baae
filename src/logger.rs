/// Logging collaborator receiving pre-formatted messages.
///
/// Any `Fn(&str)` closure is a logger, which keeps ad-hoc capture in tests
/// and host applications short.
#[cfg_attr(test, mockall::automock)]
pub trait Logger: Send + Sync {
    fn error(&self, message: &str);
}

/// [`Logger`] forwarding to `tracing` at error level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "gateway_http", "{message}");
    }
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn error(&self, message: &str) {
        self(message)
    }
}
