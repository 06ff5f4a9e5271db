//! Pipeline progress logging.
//!
//! Four levels, matching how a run reports itself: plain steps, completed
//! steps, suspicious-but-recoverable data, and failures. Each helper emits a
//! `tracing` event with a `status` field so a subscriber can format or filter
//! on it.

use tracing_subscriber::EnvFilter;

/// Log level for pipeline progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-steps
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Emit the entry as a `tracing` event.
    pub fn emit(&self) {
        let message = format!("{}{}", "  ".repeat(self.indent as usize), self.message);
        let status = self.level.as_str();
        match self.level {
            LogLevel::Info | LogLevel::Success => tracing::info!(status, "{}", message),
            LogLevel::Warning => tracing::warn!(status, "{}", message),
            LogLevel::Error => tracing::error!(status, "{}", message),
        }
    }
}

pub fn log_info(msg: impl Into<String>) {
    LogEntry::info(msg).emit();
}

pub fn log_success(msg: impl Into<String>) {
    LogEntry::success(msg).emit();
}

pub fn log_warning(msg: impl Into<String>) {
    LogEntry::warning(msg).emit();
}

pub fn log_error(msg: impl Into<String>) {
    LogEntry::error(msg).emit();
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LogEntry::info(msg).with_indent(indent).emit();
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. `"info"`) applies.
/// Output goes to stderr so stdout stays free for command output.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builders() {
        let entry = LogEntry::warning("organic series is empty").with_indent(2);
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.indent, 2);
    }

    #[test]
    fn test_level_status_names() {
        assert_eq!(LogEntry::success("done").level.as_str(), "success");
        assert_eq!(LogLevel::Warning.as_str(), "warning");
    }

    #[test]
    fn test_emit_without_subscriber_is_noop() {
        log_info("no subscriber installed");
        log_error("still fine");
    }
}
