//! Query execution
//!
//! Owns the connection handle, runs one statement at a time, and drives the
//! configured formatter through the row stream. A connection found dead by
//! the pre-query liveness check is re-established transparently (with a
//! warning) instead of failing the query; an error reported by the server
//! surfaces as a database error the caller can treat as non-fatal.

use std::io::{self, IsTerminal, Write};
use std::time::Instant;

use colored::Colorize;

use crate::driver::{ConnectOptions, Connection, Driver};
use crate::error::Result;
use crate::formatter::{Format, Formatter};

pub struct QueryExecutor {
    driver: Box<dyn Driver>,
    opts: ConnectOptions,
    conn: Box<dyn Connection>,
}

impl QueryExecutor {
    /// Establish the initial connection. Failure here is fatal to the
    /// caller (a session never starts without a live handle).
    pub fn connect(driver: Box<dyn Driver>, opts: ConnectOptions) -> Result<QueryExecutor> {
        let conn = driver.connect(&opts)?;
        Ok(QueryExecutor { driver, opts, conn })
    }

    /// Execute one statement and stream its rows through a fresh formatter
    /// into `sink`. Returns the number of rows fetched.
    pub fn run_query(
        &mut self,
        sql: &str,
        args: &[String],
        format: Format,
        sink: &mut dyn Write,
    ) -> Result<u64> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(0);
        }

        // Transient connection loss is recovered here, before execution;
        // it is not a query error.
        if !self.conn.ping() {
            eprintln!("{}", "warning: connection lost, reconnecting".yellow());
            self.conn = self.driver.connect(&self.opts)?;
        }

        let started = Instant::now();
        let mut formatter = Formatter::new(format);

        let streamed = stream_rows(self.conn.as_mut(), &mut formatter, sink, sql, args);
        // finish runs on success and on fetch-time failure alike
        let finished = formatter.finish(sink);
        let count = streamed?;
        finished?;
        sink.flush()?;

        self.report(count, started.elapsed().as_secs_f64());
        Ok(count)
    }

    /// Row count and elapsed time, on the diagnostic channel, only when it
    /// is attached to an interactive terminal.
    fn report(&self, count: u64, elapsed: f64) {
        if !io::stderr().is_terminal() {
            return;
        }
        let noun = if count == 1 { "row" } else { "rows" };
        eprintln!(
            "{}",
            format!("{} {} in set ({:.1} sec)", count, noun, elapsed).dimmed()
        );
    }
}

fn stream_rows(
    conn: &mut dyn Connection,
    formatter: &mut Formatter,
    sink: &mut dyn Write,
    sql: &str,
    args: &[String],
) -> Result<u64> {
    let mut rows = conn.execute(sql, args)?;
    let columns = rows.columns().to_vec();

    // Statements without a result set never start the formatter
    if !columns.is_empty() {
        formatter.start(sink, &columns)?;
    }

    let mut count = 0u64;
    while let Some(row) = rows.next_row() {
        formatter.output(sink, &row?)?;
        count += 1;
    }
    Ok(count)
}
