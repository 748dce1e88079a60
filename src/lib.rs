//! Library entry point for tdsql components.
//!
//! Exposes reusable modules (formatter, executor, session, config, etc.) so
//! integration tests can exercise CLI formatting and behaviors without going
//! through the binary entry point.

pub mod config;
pub mod driver;
pub mod editor;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod history;
pub mod parser;
pub mod session;

pub use config::CliConfig;
pub use driver::{Charset, ConnectOptions, Driver, MysqlDriver, SessionMode};
pub use error::{CliError, Result};
pub use executor::QueryExecutor;
pub use formatter::{Format, Formatter, OutputSink};
pub use history::CommandHistory;
pub use session::Session;
