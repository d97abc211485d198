use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the ledger file location.
pub const LEDGER_PATH_ENV: &str = "WAL_KV_LEDGER_PATH";

/// Configuration for the wal-kv CLI tool
///
/// The library itself only needs a ledger path; format and log level are for the front end.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ledger file path (default: `wal.log` in current directory)
    pub ledger_path: PathBuf,

    /// Output format: "human" (default) or "json"
    pub output_format: String,

    /// Log level: "error", "warn", "info", "debug", "trace" (default: "warn")
    pub log_level: String,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        let ledger_path = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("wal.log");

        Config {
            ledger_path,
            output_format: "human".to_string(),
            log_level: "warn".to_string(),
        }
    }

    /// Create config with a custom ledger path
    pub fn with_ledger_path(ledger_path: PathBuf) -> Self {
        Config {
            ledger_path,
            ..Config::new()
        }
    }

    /// Get the ledger file path
    pub fn get_ledger_path(&self) -> &PathBuf {
        &self.ledger_path
    }

    /// Set ledger file path
    pub fn set_ledger_path(&mut self, path: PathBuf) {
        self.ledger_path = path;
    }

    /// Get output format
    pub fn get_output_format(&self) -> &str {
        &self.output_format
    }

    /// Set output format ("human" or "json")
    pub fn set_output_format(&mut self, format: String) {
        self.output_format = format;
    }

    /// Get log level
    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    /// Set log level
    pub fn set_log_level(&mut self, level: String) {
        self.log_level = level;
    }

    /// Load config from the environment.
    ///
    /// Only `WAL_KV_LEDGER_PATH` is read; everything else comes from CLI flags.
    pub fn from_env() -> Self {
        let mut config = Config::new();

        if let Ok(path) = env::var(LEDGER_PATH_ENV) {
            config.ledger_path = PathBuf::from(path);
        }

        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
