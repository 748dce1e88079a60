use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tdsql::{Charset, Format, SessionMode};

/// Format names accepted on the command line. Combined with `--header`
/// to select the header variants of the delimited formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Text,
    Csv,
    Vbar,
    Box,
    Vertical,
}

impl FormatArg {
    pub fn to_format(self, header: bool) -> Format {
        let base = match self {
            FormatArg::Text => Format::Text,
            FormatArg::Csv => Format::Csv,
            FormatArg::Vbar => Format::Vbar,
            FormatArg::Box => Format::Box,
            FormatArg::Vertical => Format::Vertical,
        };
        base.with_header(header)
    }
}

/// tdsql - Interactive SQL terminal for remote data warehouses
#[derive(Parser, Debug)]
#[command(name = "tdsql")]
#[command(version)]
#[command(about = "Interactive SQL terminal for remote data warehouses", long_about = None)]
pub struct Cli {
    /// Warehouse host, optionally host:port
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// User name
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Password
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Default database
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Session character set
    #[arg(long, value_enum)]
    pub charset: Option<Charset>,

    /// Session mode
    #[arg(long, value_enum)]
    pub mode: Option<SessionMode>,

    /// Write query results to this file (- means stdout)
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<FormatArg>,

    /// Emit a header record before data rows (delimited formats)
    #[arg(long)]
    pub header: bool,

    /// Disable colored diagnostics
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Configuration file path
    #[arg(long, default_value = "~/.tdsql/config.toml")]
    pub config: PathBuf,

    /// SQL statement to execute; reads standard input when omitted and
    /// stdin is not a terminal, otherwise starts an interactive session
    pub sql: Option<String>,

    /// Positional query arguments bound to ? placeholders
    pub params: Vec<String>,
}
