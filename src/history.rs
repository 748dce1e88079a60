//! Command history persistence
//!
//! Maintains command history across sessions in ~/.tdsql/history. Entries
//! are appended as commands complete, so history survives a fatal exit
//! without a separate flush step. Multi-line statements are stored on one
//! line with newlines encoded, keeping the file one-entry-per-line.

use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Command history manager
pub struct CommandHistory {
    /// History file path
    path: PathBuf,

    /// Maximum history size
    max_size: usize,
}

impl CommandHistory {
    /// Create a new history manager
    pub fn new(max_size: usize) -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let path = PathBuf::from(home).join(".tdsql").join("history");

        Self { path, max_size }
    }

    /// Create with custom path
    pub fn with_path<P: AsRef<Path>>(path: P, max_size: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_size,
        }
    }

    /// Load history from file, oldest first
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| CliError::History(format!("failed to read history file: {}", e)))?;

        let lines: Vec<String> = contents
            .lines()
            .map(decode_entry)
            .rev()
            .take(self.max_size)
            .collect();

        Ok(lines.into_iter().rev().collect())
    }

    /// Save history to file
    pub fn save(&self, history: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Take last max_size entries
        let entries: Vec<&String> = history.iter().rev().take(self.max_size).collect();
        let entries: Vec<&String> = entries.into_iter().rev().collect();

        let contents = entries
            .iter()
            .map(|s| encode_entry(s))
            .collect::<Vec<_>>()
            .join("\n");

        std::fs::write(&self.path, contents)
            .map_err(|e| CliError::History(format!("failed to write history file: {}", e)))?;

        Ok(())
    }

    /// Append a command to history
    pub fn append(&self, command: &str) -> Result<()> {
        let mut history = self.load()?;

        // Skip empty and consecutive duplicate commands
        if command.trim().is_empty() {
            return Ok(());
        }
        if history.last().map(|s| s.as_str()) == Some(command) {
            return Ok(());
        }

        history.push(command.to_string());
        self.save(&history)?;
        Ok(())
    }

    /// Most recent entry, if any
    pub fn last(&self) -> Result<Option<String>> {
        Ok(self.load()?.pop())
    }

    /// Get history file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn encode_entry(entry: &str) -> String {
    entry.replace('\n', "\\n")
}

fn decode_entry(line: &str) -> String {
    line.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_history_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let history = CommandHistory::with_path(&path, 100);

        let commands = vec!["SELECT 1;".to_string(), "SELECT 2;".to_string()];
        history.save(&commands).unwrap();

        let loaded = history.load().unwrap();
        assert_eq!(loaded, commands);
    }

    #[test]
    fn test_history_max_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let history = CommandHistory::with_path(&path, 2);

        let commands = vec![
            "SELECT 1;".to_string(),
            "SELECT 2;".to_string(),
            "SELECT 3;".to_string(),
        ];
        history.save(&commands).unwrap();

        let loaded = history.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], "SELECT 2;");
        assert_eq!(loaded[1], "SELECT 3;");
    }

    #[test]
    fn test_append_and_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let history = CommandHistory::with_path(&path, 100);

        history.append("SELECT 1;").unwrap();
        history.append("SELECT 2;").unwrap();

        let loaded = history.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(history.last().unwrap(), Some("SELECT 2;".to_string()));
    }

    #[test]
    fn test_append_skips_consecutive_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let history = CommandHistory::with_path(&path, 100);

        history.append("SELECT 1;").unwrap();
        history.append("SELECT 1;").unwrap();

        assert_eq!(history.load().unwrap().len(), 1);
    }

    #[test]
    fn test_multiline_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        let history = CommandHistory::with_path(&path, 100);

        let statement = "SELECT *\nFROM orders\nWHERE id = 1;";
        history.append(statement).unwrap();

        assert_eq!(history.last().unwrap(), Some(statement.to_string()));
    }
}
