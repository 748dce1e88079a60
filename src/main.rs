//! tdsql - Interactive SQL terminal for remote data warehouses
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! tdsql -H dwh.example.com -u analyst -p secret
//!
//! # One query, results as CSV with a header record
//! tdsql -f csv --header "SELECT * FROM sales WHERE region = ?" EMEA
//!
//! # Batch mode from a script
//! tdsql < report.sql
//! ```

use clap::Parser;
use std::io::{IsTerminal, Read};

use tdsql::Result;

mod args;
mod connect;

use args::Cli;
use connect::create_session;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Connection and file handles release on drop, on this path too
        eprintln!("tdsql: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut session = create_session(&cli)?;

    match &cli.sql {
        // Execute single statement with bound arguments
        Some(sql) => {
            session.execute(sql, &cli.params)?;
        },

        None => {
            if std::io::stdin().is_terminal() {
                // Interactive mode
                session.run_interactive()?;
            } else {
                // Batch mode: statements piped on stdin
                let mut script = String::new();
                std::io::stdin().read_to_string(&mut script)?;
                session.execute_batch(&script)?;
            }
        },
    }

    Ok(())
}
