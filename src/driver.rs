//! Database capability for tdsql
//!
//! The wire protocol is an external collaborator behind a narrow seam:
//! connect, ping, execute-with-positional-arguments, and a forward-only row
//! stream that yields the column-name sequence once. The shipped
//! implementation speaks the MySQL wire protocol via rust-mysql-simple;
//! tests substitute their own [`Driver`].

use clap::ValueEnum;
use mysql::prelude::Queryable;
use mysql::{Binary, Conn, OptsBuilder, Params, QueryResult, Text, Value};

use crate::error::{CliError, Result};

/// Session character set, forwarded to the server at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Charset {
    Ascii,
    Utf8,
}

impl Charset {
    pub fn from_name(name: &str) -> Result<Charset> {
        match name.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Charset::Ascii),
            "utf8" => Ok(Charset::Utf8),
            other => Err(CliError::Config(format!("unknown charset: {}", other))),
        }
    }

    fn set_names(self) -> &'static str {
        match self {
            Charset::Ascii => "SET NAMES ascii",
            Charset::Utf8 => "SET NAMES utf8mb4",
        }
    }
}

/// Session transaction/semantics mode, forwarded verbatim as `sql_mode`.
/// The client does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionMode {
    Ansi,
    Teradata,
}

impl SessionMode {
    pub fn from_name(name: &str) -> Result<SessionMode> {
        match name.to_ascii_lowercase().as_str() {
            "ansi" => Ok(SessionMode::Ansi),
            "teradata" => Ok(SessionMode::Teradata),
            other => Err(CliError::Config(format!("unknown mode: {}", other))),
        }
    }

    fn set_session_mode(self) -> String {
        let mode = match self {
            SessionMode::Ansi => "ANSI",
            SessionMode::Teradata => "TERADATA",
        };
        format!("SET SESSION sql_mode = '{}'", mode)
    }
}

/// Everything needed to (re)establish a connection. Owned by the query
/// executor so transparent reconnection needs no ambient state.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub charset: Option<Charset>,
    pub mode: Option<SessionMode>,
}

/// Connection factory.
pub trait Driver {
    fn connect(&self, opts: &ConnectOptions) -> Result<Box<dyn Connection>>;
}

/// One live session to the server. Accessed strictly sequentially, at most
/// one in-flight query at a time.
pub trait Connection {
    /// Liveness probe. `false` means the handle must be re-established.
    fn ping(&mut self) -> bool;

    /// Execute one statement with positional arguments bound to `?`
    /// placeholders. The returned stream borrows the connection.
    fn execute<'a>(&'a mut self, sql: &str, args: &[String]) -> Result<Box<dyn Rows + 'a>>;
}

/// Forward-only row stream. `columns` is empty for statements that produce
/// no result set.
pub trait Rows {
    fn columns(&self) -> &[String];

    /// Next row, fields in column order, each independently nullable.
    fn next_row(&mut self) -> Option<Result<Vec<Option<String>>>>;
}

/// MySQL-protocol driver.
pub struct MysqlDriver;

impl Driver for MysqlDriver {
    fn connect(&self, opts: &ConnectOptions) -> Result<Box<dyn Connection>> {
        let (host, port) = split_host_port(&opts.host);

        let mut init = Vec::new();
        if let Some(charset) = opts.charset {
            init.push(charset.set_names().to_string());
        }
        if let Some(mode) = opts.mode {
            init.push(mode.set_session_mode());
        }

        let mut builder = OptsBuilder::new()
            .ip_or_hostname(Some(host.to_string()))
            .user(Some(opts.user.clone()))
            .pass(Some(opts.password.clone()))
            .db_name(opts.database.clone())
            .init(init);
        if let Some(port) = port {
            builder = builder.tcp_port(port);
        }

        let conn = Conn::new(builder).map_err(|e| CliError::Connect(e.to_string()))?;
        Ok(Box::new(MysqlConnection { conn }))
    }
}

struct MysqlConnection {
    conn: Conn,
}

impl Connection for MysqlConnection {
    fn ping(&mut self) -> bool {
        self.conn.ping()
    }

    fn execute<'a>(&'a mut self, sql: &str, args: &[String]) -> Result<Box<dyn Rows + 'a>> {
        let inner = if args.is_empty() {
            RowsInner::Text(self.conn.query_iter(sql)?)
        } else {
            let params =
                Params::Positional(args.iter().map(|a| Value::from(a.as_str())).collect());
            RowsInner::Binary(self.conn.exec_iter(sql, params)?)
        };

        let columns = match &inner {
            RowsInner::Text(r) => column_names(r.columns().as_ref()),
            RowsInner::Binary(r) => column_names(r.columns().as_ref()),
        };

        Ok(Box::new(MysqlRows { columns, inner }))
    }
}

enum RowsInner<'a> {
    Text(QueryResult<'a, 'a, 'a, Text>),
    Binary(QueryResult<'a, 'a, 'a, Binary>),
}

struct MysqlRows<'a> {
    columns: Vec<String>,
    inner: RowsInner<'a>,
}

impl Rows for MysqlRows<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Option<Result<Vec<Option<String>>>> {
        let item = match &mut self.inner {
            RowsInner::Text(r) => r.next(),
            RowsInner::Binary(r) => r.next(),
        };
        item.map(|res| {
            res.map(|row| row.unwrap().into_iter().map(value_to_text).collect())
                .map_err(CliError::from)
        })
    }
}

fn column_names(columns: &[mysql::Column]) -> Vec<String> {
    columns.iter().map(|c| c.name_str().into_owned()).collect()
}

/// Render a driver value as display text. NULL stays `None`; everything
/// else becomes the server's textual form.
fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Int(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        temporal => Some(temporal.as_sql(true).trim_matches('\'').to_string()),
    }
}

/// Accept `host` or `host:port`. Anything unparseable after the last colon
/// is treated as part of the host name.
fn split_host_port(host: &str) -> (&str, Option<u16>) {
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse::<u16>() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        None => (host, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("dwh.example.com"), ("dwh.example.com", None));
        assert_eq!(split_host_port("dwh.example.com:3306"), ("dwh.example.com", Some(3306)));
        assert_eq!(split_host_port("dwh:not-a-port"), ("dwh:not-a-port", None));
    }

    #[test]
    fn test_charset_and_mode_names() {
        assert_eq!(Charset::from_name("UTF8").unwrap(), Charset::Utf8);
        assert_eq!(Charset::from_name("ascii").unwrap(), Charset::Ascii);
        assert!(Charset::from_name("latin1").is_err());

        assert_eq!(SessionMode::from_name("ansi").unwrap(), SessionMode::Ansi);
        assert_eq!(SessionMode::from_name("TERADATA").unwrap(), SessionMode::Teradata);
        assert!(SessionMode::from_name("strict").is_err());
    }

    #[test]
    fn test_session_init_statements() {
        assert_eq!(Charset::Utf8.set_names(), "SET NAMES utf8mb4");
        assert_eq!(
            SessionMode::Teradata.set_session_mode(),
            "SET SESSION sql_mode = 'TERADATA'"
        );
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(Value::NULL), None);
        assert_eq!(value_to_text(Value::Int(-7)), Some("-7".to_string()));
        assert_eq!(
            value_to_text(Value::Bytes(b"hello".to_vec())),
            Some("hello".to_string())
        );
    }
}
