use std::fmt::{self, Write as _};

/// Verbose transcript of the most recent request.
///
/// Lines use a one-character prefix: `*` for informational lines, `>` for
/// data sent and `<` for data received. The buffer is owned by the transport
/// handle, cleared before every request and dropped with the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    enabled: bool,
    buffer: String,
}

impl DiagnosticLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            buffer: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn info(&mut self, line: impl fmt::Display) {
        self.push('*', line);
    }

    pub fn sent(&mut self, line: impl fmt::Display) {
        self.push('>', line);
    }

    pub fn received(&mut self, line: impl fmt::Display) {
        self.push('<', line);
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn push(&mut self, prefix: char, line: impl fmt::Display) {
        if self.enabled {
            // Writing into a String cannot fail.
            let _ = writeln!(self.buffer, "{prefix} {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DiagnosticLog;

    #[test]
    fn records_prefixed_lines_when_enabled() {
        let mut log = DiagnosticLog::new(true);
        log.info("Trying 127.0.0.1");
        log.sent("POST /pay");
        log.received("HTTP/1.1 200 OK");
        assert_eq!(
            log.as_str(),
            "* Trying 127.0.0.1\n> POST /pay\n< HTTP/1.1 200 OK\n"
        );

        log.clear();
        assert!(log.as_str().is_empty());
    }

    #[test]
    fn disabled_log_stays_empty() {
        let mut log = DiagnosticLog::new(false);
        log.sent("GET /");
        assert!(log.as_str().is_empty());
    }
}
