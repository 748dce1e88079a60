//! Configuration file management
//!
//! TOML configuration at ~/.tdsql/config.toml. Command-line flags override
//! anything set here.
//!
//! # Configuration Format
//!
//! ```toml
//! [connection]
//! host = "dwh.example.com"   # warehouse host, optionally host:port
//! user = "analyst"
//! password = "secret"
//! database = "sales"
//! charset = "utf8"           # ascii, utf8
//! mode = "ansi"              # ansi, teradata
//!
//! [ui]
//! format = "text"            # text, csv, vbar, box, vertical
//! header = false
//! color = true
//! history_size = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// CLI configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Warehouse connection settings
    pub connection: Option<ConnectionConfig>,

    /// UI preferences
    pub ui: Option<UiConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,

    /// Session character set: ascii, utf8
    pub charset: Option<String>,

    /// Session mode: ansi, teradata
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Output format: text, csv, vbar, box, vertical
    #[serde(default = "default_format")]
    pub format: String,

    /// Emit a header record before data rows (delimited formats)
    #[serde(default)]
    pub header: bool,

    /// Enable colored diagnostics
    #[serde(default = "default_color")]
    pub color: bool,

    /// Maximum history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_format() -> String {
    "text".to_string()
}

fn default_color() -> bool {
    true
}

fn default_history_size() -> usize {
    1000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            header: false,
            color: default_color(),
            history_size: default_history_size(),
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let path_str = path.to_str().unwrap_or("~/.tdsql/config.toml");
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    expand_config_path(Path::new("~/.tdsql/config.toml"))
}

impl CliConfig {
    /// Load configuration from file
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded = expand_config_path(path);

        if !expanded.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&expanded)?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn resolved_connection(&self) -> ConnectionConfig {
        self.connection.clone().unwrap_or_default()
    }

    pub fn resolved_ui(&self) -> UiConfig {
        self.ui.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(config.connection.is_none());
        let ui = config.resolved_ui();
        assert_eq!(ui.format, "text");
        assert!(!ui.header);
        assert!(ui.color);
        assert_eq!(ui.history_size, 1000);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: CliConfig = toml::from_str(
            r#"
            [connection]
            host = "dwh.example.com:3306"
            user = "analyst"

            [ui]
            format = "box"
            "#,
        )
        .unwrap();

        let conn = config.resolved_connection();
        assert_eq!(conn.host.as_deref(), Some("dwh.example.com:3306"));
        assert_eq!(conn.user.as_deref(), Some("analyst"));
        assert!(conn.password.is_none());

        let ui = config.resolved_ui();
        assert_eq!(ui.format, "box");
        // Unset fields fall back to serde defaults
        assert!(ui.color);
        assert_eq!(ui.history_size, 1000);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert!(config.ui.is_none());
    }

    #[test]
    fn test_expand_tilde() {
        std::env::set_var("HOME", "/home/analyst");
        let expanded = expand_config_path(Path::new("~/.tdsql/config.toml"));
        assert_eq!(expanded, PathBuf::from("/home/analyst/.tdsql/config.toml"));
    }
}
