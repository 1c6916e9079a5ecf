//! Structured logging with address redaction
//!
//! Owner addresses and transaction hashes are only ever logged in
//! truncated form. Signature bytes are never logged.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag to enable/disable debug logging
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable debug logging
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

/// Disable debug logging
pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

/// Check if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Add an address or hash field (partial redaction)
    pub fn address_field(mut self, key: &'static str, address: impl fmt::Display) -> Self {
        self.fields.push((key, redact_address(&address.to_string())));
        self
    }

    /// Log the entry
    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let fields_str = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        if fields_str.is_empty() {
            eprintln!("[{}] {} [{}] {}", timestamp, self.level, self.module, self.message);
        } else {
            eprintln!(
                "[{}] {} [{}] {} | {}",
                timestamp, self.level, self.module, self.message, fields_str
            );
        }
    }
}

/// Partially redact an address or hash (show first 6 and last 4 chars)
pub fn redact_address(value: &str) -> String {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 10 {
        return trimmed.to_string();
    }

    format!("{}…{}", &trimmed[..6], &trimmed[trimmed.len() - 4..])
}

/// Convenience: log an info entry
pub fn info(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Info, module, message)
}

/// Convenience: log a warning entry
pub fn warn(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Warn, module, message)
}

/// Convenience: log a debug entry
pub fn debug(module: &'static str, message: impl Into<String>) -> LogEntry {
    LogEntry::new(LogLevel::Debug, module, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_address() {
        let full = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let redacted = redact_address(full);
        assert!(redacted.starts_with("0x5aAe"));
        assert!(redacted.ends_with("eAed"));
        assert!(redacted.len() < full.len());
    }

    #[test]
    fn test_redact_short_value() {
        assert_eq!(redact_address("0x1234"), "0x1234");
        assert_eq!(redact_address(""), "[EMPTY]");
    }

    #[test]
    fn test_entry_builds_fields() {
        let entry = info("test", "hello")
            .field("count", 3)
            .address_field("safe", "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(entry.fields.len(), 2);
        assert!(entry.fields[1].1.contains('…'));
    }
}
