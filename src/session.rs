//! Interactive session controller
//!
//! The read-eval loop: multi-line SQL accumulation, slash meta-command
//! dispatch, interrupt-safe line reading, and non-fatal recovery from
//! server-reported errors. Session state (output sink, output format,
//! connection handle) lives here and is mutated only by meta-commands.
//!
//! Ctrl+C is caught by the line reader and scoped to the read itself: at an
//! idle prompt it discards pending input and re-prompts. A query in flight
//! is not cancellable; an interrupt there follows normal process behavior.

use std::io::Write as _;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::editor::edit_text;
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::formatter::{Format, OutputSink};
use crate::history::CommandHistory;
use crate::parser::{Command, CommandParser};

const PRIMARY_PROMPT: &str = "tdsql> ";
const CONTINUATION_PROMPT: &str = "    -> ";

/// How a completed statement was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    /// `;`: execute with the session format
    Semicolon,
    /// `\G`: execute with vertical format, this statement only
    Vertical,
    /// `\e`: hand the statement to the external editor
    Edit,
}

/// Split a trailing statement terminator off accumulated input.
/// Returns `None` while the statement is still incomplete.
fn split_terminator(text: &str) -> Option<(&str, Terminator)> {
    let trimmed = text.trim_end();
    if trimmed.ends_with(';') {
        return Some((&trimmed[..trimmed.len() - 1], Terminator::Semicolon));
    }
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 && bytes[bytes.len() - 2] == b'\\' {
        let body = &trimmed[..trimmed.len() - 2];
        match bytes[bytes.len() - 1] {
            b'g' | b'G' => return Some((body, Terminator::Vertical)),
            b'e' | b'E' => return Some((body, Terminator::Edit)),
            _ => {},
        }
    }
    None
}

/// Outcome of a meta-command.
#[derive(Debug)]
enum Reply {
    Continue,
    Quit,
    /// Pre-fill the next prompt with this text
    Prefill(String),
}

/// Interactive CLI session
pub struct Session {
    executor: QueryExecutor,
    parser: CommandParser,
    format: Format,
    sink: OutputSink,
    history: CommandHistory,

    /// Host label for the banner
    server: String,
}

impl Session {
    pub fn new(
        executor: QueryExecutor,
        format: Format,
        sink: OutputSink,
        history: CommandHistory,
        server: String,
    ) -> Session {
        Session {
            executor,
            parser: CommandParser::new(),
            format,
            sink,
            history,
            server,
        }
    }

    /// Execute one statement with the session format (batch entry point).
    pub fn execute(&mut self, sql: &str, args: &[String]) -> Result<u64> {
        self.executor.run_query(sql, args, self.format, &mut self.sink)
    }

    /// Execute a `;`-separated script, stopping at the first failure.
    pub fn execute_batch(&mut self, script: &str) -> Result<()> {
        for statement in script.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                self.execute(statement, &[])?;
            }
        }
        Ok(())
    }

    /// Format to use for one statement, honoring the `\G` override without
    /// touching session state.
    fn format_for(&self, terminator: Terminator) -> Format {
        match terminator {
            Terminator::Vertical => Format::Vertical,
            _ => self.format,
        }
    }

    fn run_statement(&mut self, statement: &str, terminator: Terminator) -> Result<u64> {
        let format = self.format_for(terminator);
        self.executor.run_query(statement, &[], format, &mut self.sink)
    }

    /// Run the interactive readline loop until exit, end-of-input, or a
    /// fatal error.
    pub fn run_interactive(&mut self) -> Result<()> {
        self.print_banner();

        let mut rl = DefaultEditor::new()?;
        if let Ok(entries) = self.history.load() {
            for entry in entries {
                let _ = rl.add_history_entry(&entry);
            }
        }

        // History is appended per command, so every terminal path
        // (/exit, EOF, fatal error) leaves it persisted.
        self.repl(&mut rl)
    }

    fn repl(&mut self, rl: &mut DefaultEditor) -> Result<()> {
        let mut pending = String::new();
        let mut prefill = String::new();

        loop {
            let prompt = if pending.is_empty() {
                PRIMARY_PROMPT
            } else {
                CONTINUATION_PROMPT
            };

            let read = if prefill.is_empty() {
                rl.readline(prompt)
            } else {
                let initial = std::mem::take(&mut prefill);
                rl.readline_with_initial(prompt, (&initial, ""))
            };

            match read {
                Ok(line) => {
                    let line = line.trim();

                    // Meta-commands are single complete lines at the
                    // primary prompt; inside a statement a slash is SQL.
                    if pending.is_empty() {
                        if line.is_empty() {
                            continue;
                        }
                        if line.starts_with('/') {
                            self.record(rl, line);
                            match self.parser.parse(line).and_then(|c| self.dispatch(c)) {
                                Ok(Reply::Quit) => break,
                                Ok(Reply::Prefill(text)) => prefill = text,
                                Ok(Reply::Continue) => {},
                                // Meta-commands never touch the query
                                // path; their failures are never fatal
                                Err(e) => eprintln!("{}", e.to_string().red()),
                            }
                            continue;
                        }
                    }

                    if !pending.is_empty() {
                        pending.push('\n');
                    }
                    pending.push_str(line);

                    let Some((body, terminator)) = split_terminator(&pending) else {
                        continue;
                    };
                    let statement = body.trim().to_string();
                    let typed = pending.trim().to_string();
                    pending.clear();

                    if statement.is_empty() {
                        continue;
                    }

                    if terminator == Terminator::Edit {
                        match edit_text(&statement) {
                            Ok(text) if !text.is_empty() => prefill = text,
                            Ok(_) => {},
                            Err(e) => eprintln!("{}", e.to_string().red()),
                        }
                        continue;
                    }

                    // One history entry per completed command, as typed
                    self.record(rl, &typed);

                    match self.run_statement(&statement, terminator) {
                        Ok(_) => {},
                        Err(e) if e.is_recoverable() => {
                            eprintln!("{}", e.to_string().red());
                        },
                        Err(e) => return Err(e),
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    if !pending.is_empty() {
                        eprintln!("{}", "statement cancelled".yellow());
                        pending.clear();
                    } else {
                        eprintln!("{}", "Use /exit to quit".dimmed());
                    }
                    continue;
                },
                Err(ReadlineError::Eof) => {
                    eprintln!("{}", "Goodbye!".dimmed());
                    break;
                },
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    fn record(&self, rl: &mut DefaultEditor, text: &str) {
        let _ = rl.add_history_entry(text);
        let _ = self.history.append(text);
    }

    /// Execute a parsed meta-command.
    fn dispatch(&mut self, command: Command) -> Result<Reply> {
        match command {
            Command::Sql(sql) => {
                self.execute(&sql, &[])?;
            },
            Command::Help => {
                self.show_help();
            },
            Command::Output(path) => {
                let _ = self.sink.flush();
                self.sink = OutputSink::open(path.as_deref())?;
                eprintln!("writing results to {}", self.sink.description());
            },
            Command::Close => {
                let _ = self.sink.flush();
                self.sink = OutputSink::stdout();
                eprintln!("writing results to stdout");
            },
            Command::Format(None) => {
                eprintln!("format is {}", self.format.name());
            },
            Command::Format(Some(name)) => {
                // Validated here so an invalid name never reaches state
                self.format = Format::from_name(&name)?;
                eprintln!("format set to {}", self.format.name());
            },
            Command::Header(None) => {
                let state = if self.format.headed() { "on" } else { "off" };
                eprintln!("header is {}", state);
            },
            Command::Header(Some(arg)) => {
                self.format = self.format.with_header(arg == "on");
                eprintln!("format set to {}", self.format.name());
            },
            Command::Cheatsheet => {
                self.show_cheatsheet();
            },
            Command::Edit => {
                return match self.history.last()? {
                    Some(previous) => Ok(Reply::Prefill(edit_text(&previous)?)),
                    None => {
                        eprintln!("{}", "history is empty, nothing to edit".yellow());
                        Ok(Reply::Continue)
                    },
                };
            },
            Command::Quit => {
                eprintln!("{}", "Goodbye!".dimmed());
                return Ok(Reply::Quit);
            },
            Command::Unknown(cmd) => {
                eprintln!(
                    "{}",
                    format!("unknown command: {}. Type /help for help.", cmd).red()
                );
            },
        }
        Ok(Reply::Continue)
    }

    fn print_banner(&self) {
        eprintln!("tdsql {}", env!("CARGO_PKG_VERSION"));
        eprintln!("Connected to {}", self.server);
        eprintln!("Type /help for help, /exit to quit.");
        eprintln!();
    }

    fn show_help(&self) {
        eprintln!("Statements end with ; (or \\G for vertical output, \\e to edit).");
        eprintln!();
        eprintln!("Meta-commands:");
        eprintln!("  /help, /?              Show this help message");
        eprintln!("  /output [file]         Write query results to file (- or no arg: stdout)");
        eprintln!("  /close                 Close the output file, back to stdout");
        eprintln!("  /format [name]         Set output format (text, csv, vbar, htext,");
        eprintln!("                         hcsv, hvbar, box, vertical); no arg shows current");
        eprintln!("  /header [on|off]       Toggle the header record for delimited formats");
        eprintln!("  /cheatsheet            Show a short SQL reference");
        eprintln!("  /edit                  Edit the previous statement in $EDITOR");
        eprintln!("  /exit, /quit           Exit the session");
    }

    fn show_cheatsheet(&self) {
        eprintln!("SELECT <cols> FROM <table> [WHERE ...] [GROUP BY ...] [ORDER BY ...];");
        eprintln!("INSERT INTO <table> (<cols>) VALUES (<values>);");
        eprintln!("UPDATE <table> SET <col> = <value> [WHERE ...];");
        eprintln!("DELETE FROM <table> [WHERE ...];");
        eprintln!("CREATE TABLE <table> (<col> <type>, ...);");
        eprintln!("DROP TABLE <table>;");
        eprintln!("SHOW TABLES;  DESCRIBE <table>;  EXPLAIN <query>;");
        eprintln!();
        eprintln!("End a statement with \\G instead of ; for one row per block.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ConnectOptions, Connection, Driver, Rows};
    use crate::error::CliError;

    struct StubRows {
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    }

    impl Rows for StubRows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn next_row(&mut self) -> Option<Result<Vec<Option<String>>>> {
            if self.rows.is_empty() {
                None
            } else {
                Some(Ok(self.rows.remove(0)))
            }
        }
    }

    struct StubConnection;

    impl Connection for StubConnection {
        fn ping(&mut self) -> bool {
            true
        }

        fn execute<'a>(&'a mut self, _sql: &str, _args: &[String]) -> Result<Box<dyn Rows + 'a>> {
            Ok(Box::new(StubRows {
                columns: vec!["id".to_string()],
                rows: vec![vec![Some("1".to_string())]],
            }))
        }
    }

    struct StubDriver;

    impl Driver for StubDriver {
        fn connect(&self, _opts: &ConnectOptions) -> Result<Box<dyn Connection>> {
            Ok(Box::new(StubConnection))
        }
    }

    fn test_session(format: Format, sink: OutputSink) -> Session {
        let opts = ConnectOptions {
            host: "dwh".into(),
            user: "u".into(),
            password: "p".into(),
            database: None,
            charset: None,
            mode: None,
        };
        let executor = QueryExecutor::connect(Box::new(StubDriver), opts).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let history = CommandHistory::with_path(dir.path().join("history"), 100);
        Session::new(executor, format, sink, history, "dwh".into())
    }

    #[test]
    fn test_split_terminator() {
        assert_eq!(
            split_terminator("SELECT 1;"),
            Some(("SELECT 1", Terminator::Semicolon))
        );
        assert_eq!(
            split_terminator("SELECT 1 \\G"),
            Some(("SELECT 1 ", Terminator::Vertical))
        );
        assert_eq!(
            split_terminator("SELECT 1\\g  "),
            Some(("SELECT 1", Terminator::Vertical))
        );
        assert_eq!(
            split_terminator("SELECT 1\\E"),
            Some(("SELECT 1", Terminator::Edit))
        );
        assert_eq!(split_terminator("SELECT 1"), None);
        assert_eq!(split_terminator("SELECT '\\n'"), None);
        assert_eq!(split_terminator(""), None);
    }

    #[test]
    fn test_vertical_override_does_not_stick() {
        let session = test_session(Format::Csv, OutputSink::stdout());
        assert_eq!(session.format_for(Terminator::Vertical), Format::Vertical);
        assert_eq!(session.format_for(Terminator::Semicolon), Format::Csv);
        assert_eq!(session.format, Format::Csv);
    }

    #[test]
    fn test_vertical_override_renders_one_statement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = OutputSink::open(path.to_str()).unwrap();
        let mut session = test_session(Format::Csv, sink);

        session.run_statement("SELECT id FROM t", Terminator::Vertical).unwrap();
        session.run_statement("SELECT id FROM t", Terminator::Semicolon).unwrap();

        let out = std::fs::read_to_string(&path).unwrap();
        let expected = "\
*************************** 1. row ***************************
id: 1
1
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_format_meta_command_validates_names() {
        let mut session = test_session(Format::Text, OutputSink::stdout());

        assert!(matches!(
            session.dispatch(Command::Format(Some("box".into()))),
            Ok(Reply::Continue)
        ));
        assert_eq!(session.format, Format::Box);

        // Invalid names are rejected before touching session state
        let err = session.dispatch(Command::Format(Some("wide".into()))).unwrap_err();
        assert!(matches!(err, CliError::Format(_)));
        assert!(err.is_recoverable());
        assert_eq!(session.format, Format::Box);
    }

    #[test]
    fn test_header_meta_command() {
        let mut session = test_session(Format::Csv, OutputSink::stdout());

        session.dispatch(Command::Header(Some("on".into()))).unwrap();
        assert_eq!(session.format, Format::HCsv);

        session.dispatch(Command::Header(Some("off".into()))).unwrap();
        assert_eq!(session.format, Format::Csv);
    }

    #[test]
    fn test_quit_terminates() {
        let mut session = test_session(Format::Text, OutputSink::stdout());
        assert!(matches!(session.dispatch(Command::Quit), Ok(Reply::Quit)));
    }
}
