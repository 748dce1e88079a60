//! Command parser for SQL and slash meta-commands
//!
//! Parses user input to distinguish between SQL statements and session
//! directives. Meta-commands start with `/` and fit on a single line.

use crate::error::{CliError, Result};

/// Parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// SQL statement
    Sql(String),

    /// Meta-commands (slash commands)
    Help,
    Output(Option<String>),
    Close,
    Format(Option<String>),
    Header(Option<String>),
    Cheatsheet,
    Edit,
    Quit,
    Unknown(String),
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a command line
    pub fn parse(&self, line: &str) -> Result<Command> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return Err(CliError::Parse("empty command".into()));
        }

        if trimmed.starts_with('/') {
            return self.parse_meta_command(trimmed);
        }

        Ok(Command::Sql(trimmed.to_string()))
    }

    /// Parse meta-commands (slash commands)
    fn parse_meta_command(&self, line: &str) -> Result<Command> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts[0];
        let args = parts.get(1..).unwrap_or(&[]);

        match command {
            "/help" | "/?" => Ok(Command::Help),
            "/output" | "/o" => Ok(Command::Output(args.first().map(|a| a.to_string()))),
            "/close" => Ok(Command::Close),
            "/format" | "/f" => Ok(Command::Format(args.first().map(|a| a.to_string()))),
            "/header" => {
                match args.first() {
                    None => Ok(Command::Header(None)),
                    Some(&arg) if arg.eq_ignore_ascii_case("on") || arg.eq_ignore_ascii_case("off") => {
                        Ok(Command::Header(Some(arg.to_ascii_lowercase())))
                    },
                    Some(other) => Err(CliError::Parse(format!(
                        "/header takes on or off, not '{}'",
                        other
                    ))),
                }
            },
            "/cheatsheet" => Ok(Command::Cheatsheet),
            "/edit" | "/e" => Ok(Command::Edit),
            "/exit" | "/quit" | "/q" => Ok(Command::Quit),
            _ => Ok(Command::Unknown(command.to_string())),
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql() {
        let parser = CommandParser::new();
        let cmd = parser.parse("SELECT * FROM orders").unwrap();
        assert_eq!(cmd, Command::Sql("SELECT * FROM orders".to_string()));
    }

    #[test]
    fn test_parse_quit() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("/exit").unwrap(), Command::Quit);
        assert_eq!(parser.parse("/quit").unwrap(), Command::Quit);
        assert_eq!(parser.parse("/q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_help() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("/help").unwrap(), Command::Help);
        assert_eq!(parser.parse("/?").unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_output() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("/output results.csv").unwrap(),
            Command::Output(Some("results.csv".to_string()))
        );
        assert_eq!(parser.parse("/output").unwrap(), Command::Output(None));
        assert_eq!(parser.parse("/close").unwrap(), Command::Close);
    }

    #[test]
    fn test_parse_format() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("/format hcsv").unwrap(),
            Command::Format(Some("hcsv".to_string()))
        );
        assert_eq!(parser.parse("/format").unwrap(), Command::Format(None));
    }

    #[test]
    fn test_parse_header() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("/header ON").unwrap(),
            Command::Header(Some("on".to_string()))
        );
        assert_eq!(
            parser.parse("/header off").unwrap(),
            Command::Header(Some("off".to_string()))
        );
        assert_eq!(parser.parse("/header").unwrap(), Command::Header(None));
        assert!(parser.parse("/header maybe").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let parser = CommandParser::new();
        let cmd = parser.parse("/unknown").unwrap();
        assert_eq!(cmd, Command::Unknown("/unknown".to_string()));
    }

    #[test]
    fn test_empty_command() {
        let parser = CommandParser::new();
        assert!(parser.parse("").is_err());
        assert!(parser.parse("   ").is_err());
    }
}
