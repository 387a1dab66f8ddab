//! Structured JSON logger
//!
//! One log line is one JSON object: `event` first, `severity` second, then
//! the caller's fields sorted by key. Lines are written synchronously with a
//! single `write_all`, so nothing is buffered between an operation and its
//! log line.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::events::Event;

/// Log severity levels, ordered from chattiest to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Per-operation detail
    Trace = 0,
    /// Lifecycle events
    Info = 1,
    /// Recoverable oddities
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// The database directory needs attention before further use
    Fatal = 4,
}

impl Severity {
    /// Returns the upper-case name used in log lines and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    fn goes_to_stderr(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Severity::Trace),
            "INFO" => Ok(Severity::Info),
            "WARN" => Ok(Severity::Warn),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Logger owned by a database handle.
///
/// Lines below `min_severity` are dropped before any formatting happens.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    min_severity: Severity,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Severity::Warn)
    }
}

impl Logger {
    /// Creates a logger that emits lines at `min_severity` and above.
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    /// Returns whether a line at `severity` would be written.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    /// Logs a typed event at its natural severity.
    pub fn event(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(event.severity(), event.as_str(), fields);
    }

    /// Logs a free-form event name at an explicit severity.
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        if captured(severity, event, fields) {
            return;
        }
        if severity.goes_to_stderr() {
            write_line(&mut io::stderr(), severity, event, fields);
        } else {
            write_line(&mut io::stdout(), severity, event, fields);
        }
    }

    /// TRACE shorthand
    pub fn trace(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Trace, event.as_str(), fields);
    }

    /// WARN shorthand
    pub fn warn(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(Severity::Warn, event.as_str(), fields);
    }
}

/// Formats one line. Fields are sorted by key so output is reproducible.
pub(crate) fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut line = String::with_capacity(64 + fields.len() * 24);
    line.push_str("{\"event\":\"");
    push_escaped(&mut line, event);
    line.push_str("\",\"severity\":\"");
    line.push_str(severity.as_str());
    line.push('"');

    let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);
    for (key, value) in sorted {
        line.push_str(",\"");
        push_escaped(&mut line, key);
        line.push_str("\":\"");
        push_escaped(&mut line, value);
        line.push('"');
    }

    line.push_str("}\n");
    line
}

fn write_line<W: Write>(out: &mut W, severity: Severity, event: &str, fields: &[(&str, &str)]) {
    let line = format_line(severity, event, fields);
    // Logging never fails the operation being logged.
    let _ = out.write_all(line.as_bytes());
    let _ = out.flush();
}

#[cfg(test)]
fn captured(severity: Severity, event: &str, fields: &[(&str, &str)]) -> bool {
    capture::write(severity, event, fields)
}

#[cfg(not(test))]
fn captured(_severity: Severity, _event: &str, _fields: &[(&str, &str)]) -> bool {
    false
}


fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("FATAL".parse::<Severity>().unwrap(), Severity::Fatal);
        assert!("loud".parse::<Severity>().is_err());
    }

    #[test]
    fn test_line_is_valid_json() {
        let line = format_line(Severity::Info, "DB_OPEN", &[("path", "/tmp/db")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "DB_OPEN");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["path"], "/tmp/db");
    }

    #[test]
    fn test_fields_sorted() {
        let a = format_line(Severity::Info, "E", &[("zeta", "1"), ("alpha", "2")]);
        let b = format_line(Severity::Info, "E", &[("alpha", "2"), ("zeta", "1")]);
        assert_eq!(a, b);
        assert!(a.find("alpha").unwrap() < a.find("zeta").unwrap());
    }

    #[test]
    fn test_escapes_quotes_and_newlines() {
        let line = format_line(Severity::Warn, "E", &[("msg", "a \"b\"\nc")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "a \"b\"\nc");
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_threshold() {
        let logger = Logger::new(Severity::Warn);
        assert!(!logger.enabled(Severity::Info));
        assert!(logger.enabled(Severity::Warn));
        assert!(logger.enabled(Severity::Fatal));
    }

    #[test]
    fn test_write_line_into_buffer() {
        let mut buffer = Vec::new();
        write_line(&mut buffer, Severity::Warn, "BATCH_ABORTED", &[("position", "2")]);
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "BATCH_ABORTED");
        assert_eq!(parsed["position"], "2");
    }

    #[test]
    fn test_capture_respects_threshold() {
        let logger = Logger::new(Severity::Warn);
        let output = capture::capture_log(|| {
            logger.event(Event::DbOpen, &[("path", "/tmp/db")]);
            logger.event(Event::BatchAborted, &[("position", "1")]);
        });
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"event\":\"BATCH_ABORTED\""));
    }
}
