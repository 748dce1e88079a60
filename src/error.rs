//! Error types for tdsql
//!
//! Provides user-friendly error messages and the recoverable/fatal split the
//! interactive loop relies on: a server-reported query error keeps the
//! session alive, anything else tears it down.

use std::fmt;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or flag error
    Config(String),

    /// Initial connection failure
    Connect(String),

    /// Server-reported query error (carries the server's own text)
    Database(String),

    /// Driver/transport error that is not a server-reported query error
    Driver(String),

    /// Unknown output format
    Format(String),

    /// Invalid command syntax
    Parse(String),

    /// File I/O error
    File(String),

    /// History file error
    History(String),

    /// External editor error
    Editor(String),

    /// Readline error
    Readline(String),

    /// User cancelled operation
    Cancelled,
}

impl CliError {
    /// Whether the interactive loop may report this error and keep running.
    ///
    /// Server-side query failures and bad meta-command arguments are query
    /// failures, not session failures. Transport loss, I/O trouble and the
    /// like propagate out and end the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CliError::Database(_)
                | CliError::Format(_)
                | CliError::Parse(_)
                | CliError::Editor(_)
                | CliError::History(_)
                | CliError::Cancelled
        )
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "configuration error: {}", msg),
            CliError::Connect(msg) => write!(f, "connection error: {}", msg),
            CliError::Database(msg) => write!(f, "{}", msg),
            CliError::Driver(msg) => write!(f, "driver error: {}", msg),
            CliError::Format(msg) => write!(f, "unknown format: {}", msg),
            CliError::Parse(msg) => write!(f, "parse error: {}", msg),
            CliError::File(msg) => write!(f, "file error: {}", msg),
            CliError::History(msg) => write!(f, "history error: {}", msg),
            CliError::Editor(msg) => write!(f, "editor error: {}", msg),
            CliError::Readline(msg) => write!(f, "input error: {}", msg),
            CliError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<mysql::Error> for CliError {
    fn from(err: mysql::Error) -> Self {
        match err {
            // Server-originated errors keep the server's message and code
            mysql::Error::MySqlError(e) => CliError::Database(e.to_string()),
            e => CliError::Driver(e.to_string()),
        }
    }
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        match err {
            rustyline::error::ReadlineError::Interrupted => CliError::Cancelled,
            rustyline::error::ReadlineError::Eof => CliError::Cancelled,
            e => CliError::Readline(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::File(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::Format("wide".into());
        assert_eq!(err.to_string(), "unknown format: wide");

        let err = CliError::Cancelled;
        assert_eq!(err.to_string(), "operation cancelled");
    }

    #[test]
    fn test_recoverable_split() {
        assert!(CliError::Database("ERROR 1064: syntax".into()).is_recoverable());
        assert!(CliError::Format("wide".into()).is_recoverable());
        assert!(!CliError::Driver("socket closed".into()).is_recoverable());
        assert!(!CliError::Connect("refused".into()).is_recoverable());
    }
}
