//! Command line configuration
//!
//! Flags for the database location and log verbosity. Logs always go to
//! stderr; stdout carries the JSON-RPC stream.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Directory name used under each candidate base directory
const DATA_DIR_NAME: &str = "habit_punchcard";

/// Command line arguments for the habit punchcard MCP server
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite database file.
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Enable info logging
    #[arg(short, long)]
    pub debug: bool,

    /// Enable debug logging (implies --debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Log level for this crate's targets
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.debug {
            "info"
        } else {
            "warn"
        }
    }

    /// `RUST_LOG` wins when set; otherwise the flags pick the level
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("habit_punchcard_mcp={}", self.log_level())))
    }

    /// Database path from `--database`, or the first writable default
    pub fn database_path(&self) -> std::io::Result<PathBuf> {
        match &self.database {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Ok(path.clone())
            }
            None => default_database_path(),
        }
    }
}

/// Pick a writable directory for `habits.db`: home, then the platform data
/// and config directories, then the working directory, then temp
pub fn default_database_path() -> std::io::Result<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|p| p.join(format!(".{}", DATA_DIR_NAME))),
        dirs::data_dir().map(|p| p.join(DATA_DIR_NAME)),
        dirs::config_dir().map(|p| p.join(DATA_DIR_NAME)),
        std::env::current_dir()
            .ok()
            .map(|p| p.join(format!(".{}", DATA_DIR_NAME))),
    ];

    for dir in candidates.iter().flatten() {
        if is_writable_dir(dir) {
            return Ok(dir.join("habits.db"));
        }
    }

    let temp = std::env::temp_dir().join(DATA_DIR_NAME);
    std::fs::create_dir_all(&temp)?;
    tracing::warn!("Using temporary directory for database: {}", temp.display());
    Ok(temp.join("habits.db"))
}

fn is_writable_dir(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".write_test");
    if std::fs::write(&probe, "ok").is_err() {
        return false;
    }
    let _ = std::fs::remove_file(&probe);
    true
}
