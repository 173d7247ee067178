/// Server configuration
///
/// Every option can be given as a command line flag or through the matching
/// environment variable. Paths that are not given explicitly are resolved
/// to a writable per-user data directory.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::CompletionMode;
use crate::storage::images::DEFAULT_MAX_BYTES;

/// Command line / environment configuration for the Habit Tracker API
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HABIT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long, env = "HABIT_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory where uploaded images are stored
    /// If not provided, an `uploads` directory next to the database is used
    #[arg(long, env = "HABIT_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Largest accepted image, in bytes
    #[arg(long, env = "HABIT_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_BYTES)]
    pub max_upload_bytes: usize,

    /// How habits are marked complete: daily photo upload or manual toggle
    #[arg(long, env = "HABIT_COMPLETION_MODE", value_enum, default_value_t = CompletionMode::Upload)]
    pub completion_mode: CompletionMode,

    /// Reject habits created without a description
    #[arg(long, env = "HABIT_REQUIRE_DESCRIPTION")]
    pub require_description: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Socket address string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log level implied by the `--debug`/`--verbose` flags
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.debug {
            "info"
        } else {
            "warn"
        }
    }

    /// Database file to use, creating its parent directory if needed
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
            None => Ok(default_data_dir()?.join("habits.db")),
        }
    }

    /// Directory for uploaded images
    pub fn upload_path(&self) -> std::io::Result<PathBuf> {
        match &self.upload_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let database = self.database_path()?;
                let base = database
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(base.join("uploads"))
            }
        }
    }
}

/// Find a writable data directory with a fallback strategy
fn default_data_dir() -> std::io::Result<PathBuf> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".habit_tracker")),
        dirs::data_dir().map(|p| p.join("habit_tracker")),
        dirs::config_dir().map(|p| p.join("habit_tracker")),
        std::env::current_dir().ok().map(|p| p.join(".habit_tracker")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            // Test if we can write to this directory
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.clone());
            }
        }
    }

    // Ultimate fallback: use a temporary directory
    let temp_path = std::env::temp_dir().join("habit_tracker");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for data: {}", temp_path.display());
    Ok(temp_path)
}
