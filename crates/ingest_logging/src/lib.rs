#![deny(missing_docs)]
//! Shared logging utilities for the ingest client workspace.
//!
//! This crate provides the `ingest_*` logging macros used across the codebase,
//! a helper for keeping credentials out of log lines, and a minimal test
//! initializer for the global logger.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! ingest_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! ingest_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! ingest_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! ingest_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! ingest_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Number of leading characters of a secret that may appear in a log line.
const REDACT_VISIBLE: usize = 4;

/// Returns a log-safe rendering of a bearer token or other secret.
///
/// Only the first few characters survive, followed by the total length, so
/// two different tokens can still be told apart in a log.
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(REDACT_VISIBLE).collect();
    format!("{visible}…({} chars)", secret.chars().count())
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redact_keeps_prefix_and_length_only() {
        let shown = redact("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert!(shown.starts_with("eyJh"));
        assert!(shown.ends_with("(32 chars)"));
        assert!(!shown.contains("payload"));
    }

    #[test]
    fn redact_short_secret() {
        assert_eq!(redact("ab"), "ab…(2 chars)");
    }
}
