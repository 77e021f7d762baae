use std::time::Duration;

use crate::{Clock, ErrorCode, Logger, Sleeper};

/// Bounds on how long and how often a connection failure is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of physical attempts, at least one.
    pub max_attempts: u32,
    /// Connect timeout of a single attempt, reserved when checking the budget.
    pub connect_timeout: Duration,
    /// Total time budget measured from the first attempt.
    pub connect_attempts_timeout: Duration,
    /// Pause between attempts.
    pub sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            connect_timeout: Duration::from_secs(5),
            connect_attempts_timeout: Duration::from_secs(20),
            sleep: Duration::from_secs(1),
        }
    }
}

/// Result of one physical attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub success: bool,
    pub error_code: ErrorCode,
}

impl AttemptOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_code: ErrorCode::OK,
        }
    }

    pub fn failed(error_code: ErrorCode) -> Self {
        Self {
            success: false,
            error_code,
        }
    }
}

/// Drives attempts until one is not retryable or the budget runs out.
///
/// After each attempt with a retryable code the controller logs the failure,
/// then evaluates [`RetryController::can_retry`], and only then sleeps before
/// the next attempt. The pause is therefore counted ahead of time in the
/// budget check: another attempt follows only while fewer than
/// `max_attempts` were made and the elapsed time plus the pause plus one
/// connect timeout still fits in the budget. No pause follows the final
/// attempt, although its log record names the configured pause. The last
/// outcome is returned as-is; turning it into an error is the caller's job.
pub struct RetryController<'a> {
    policy: &'a RetryPolicy,
    url: &'a str,
    clock: &'a dyn Clock,
    sleeper: &'a dyn Sleeper,
    logger: &'a dyn Logger,
}

impl<'a> RetryController<'a> {
    pub fn new(
        policy: &'a RetryPolicy,
        url: &'a str,
        clock: &'a dyn Clock,
        sleeper: &'a dyn Sleeper,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            policy,
            url,
            clock,
            sleeper,
            logger,
        }
    }

    pub fn run<F>(&self, mut attempt: F) -> AttemptOutcome
    where
        F: FnMut() -> AttemptOutcome,
    {
        let start = self.clock.now();
        let mut attempts = 0u32;
        loop {
            let outcome = attempt();
            attempts = attempts.saturating_add(1);

            if !outcome.error_code.is_retryable() {
                return outcome;
            }

            self.logger
                .error(&self.failure_message(attempts, outcome.error_code));

            if !self.can_retry(start, attempts) {
                tracing::debug!(attempts, "giving up on {}", self.url);
                return outcome;
            }
            self.sleeper.sleep(self.policy.sleep);
        }
    }

    /// Whether another attempt may follow `attempts` made since `start`.
    pub fn can_retry(&self, start: Duration, attempts: u32) -> bool {
        if attempts >= self.policy.max_attempts {
            return false;
        }
        let elapsed = self.clock.now().saturating_sub(start);
        let next_attempt_done = elapsed
            .saturating_add(self.policy.sleep)
            .saturating_add(self.policy.connect_timeout);
        next_attempt_done <= self.policy.connect_attempts_timeout
    }

    fn failure_message(&self, attempt: u32, code: ErrorCode) -> String {
        format!(
            "Failed to connect to {} on attempt {}.  Max attempts: {}.  Connect attempts timeout: {}.  cURL error: {}.  Sleeping for {} second(s).",
            self.url,
            attempt,
            self.policy.max_attempts,
            self.policy.connect_attempts_timeout.as_secs_f64(),
            code,
            self.policy.sleep.as_secs_f64(),
        )
    }
}
