//! External editor integration for /edit and the `\e` terminator
//!
//! Writes the statement to a scoped scratch file, runs $VISUAL/$EDITOR on
//! it, and reads the result back. The scratch file is removed when the
//! handle drops, on success and failure alike.

use std::env;
use std::fs;
use std::io::Write;
use std::process;

use crate::error::{CliError, Result};

/// Open the user's editor on `initial` and return the edited text.
pub fn edit_text(initial: &str) -> Result<String> {
    let editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| "vi".to_string());
    run_editor(&editor, initial)
}

fn run_editor(editor: &str, initial: &str) -> Result<String> {
    let mut scratch = tempfile::Builder::new()
        .prefix("tdsql-")
        .suffix(".sql")
        .tempfile()
        .map_err(|e| CliError::Editor(format!("cannot create scratch file: {}", e)))?;
    scratch
        .write_all(initial.as_bytes())
        .and_then(|_| scratch.flush())
        .map_err(|e| CliError::Editor(format!("cannot write scratch file: {}", e)))?;

    // $EDITOR may carry arguments ("code --wait")
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| CliError::Editor("editor command is empty".into()))?;

    let status = process::Command::new(program)
        .args(parts)
        .arg(scratch.path())
        .status()
        .map_err(|e| CliError::Editor(format!("cannot launch {}: {}", program, e)))?;
    if !status.success() {
        return Err(CliError::Editor(format!("{} exited with {}", program, status)));
    }

    let edited = fs::read_to_string(scratch.path())
        .map_err(|e| CliError::Editor(format!("cannot read scratch file: {}", e)))?;
    Ok(edited.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_noop_editor_returns_initial_text() {
        let text = run_editor("true", "SELECT 1").unwrap();
        assert_eq!(text, "SELECT 1");
    }

    #[test]
    #[cfg(unix)]
    fn test_failing_editor_is_an_error() {
        let err = run_editor("false", "SELECT 1").unwrap_err();
        assert!(matches!(err, CliError::Editor(_)));
    }

    #[test]
    fn test_empty_editor_command() {
        assert!(matches!(run_editor("  ", "x"), Err(CliError::Editor(_))));
    }
}
