//! Server configuration.
//!
//! Configuration is layered, later layers winning:
//! - built-in defaults
//! - a TOML file, if `--config <path>` or `PARLOR_CONFIG` names one
//! - environment variables (`PARLOR_HOST`, `PARLOR_PORT`,
//!   `PARLOR_ACCOUNTS`, `PARLOR_REPLAY_DIR`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Account log file.
    pub accounts: PathBuf,

    /// Directory holding one replay file per room.
    pub replay_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: parlor::DEFAULT_PORT,
            accounts: PathBuf::from("PlayerAccounts.txt"),
            replay_dir: PathBuf::from("replays"),
        }
    }
}

impl Config {
    /// Loads configuration from the command line and process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file was named but cannot be read or
    /// parsed, or if an environment override is invalid.
    pub fn load() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let file = match config_path_from_args(&args)? {
            Some(path) => Some(path),
            None => std::env::var_os("PARLOR_CONFIG").map(PathBuf::from),
        };

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Applies `PARLOR_*` overrides read through `var`.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = var("PARLOR_HOST") {
            self.host = host;
        }
        if let Some(port) = var("PARLOR_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("PARLOR_PORT is not a valid port: {port:?}"))?;
        }
        if let Some(accounts) = var("PARLOR_ACCOUNTS") {
            self.accounts = PathBuf::from(accounts);
        }
        if let Some(dir) = var("PARLOR_REPLAY_DIR") {
            self.replay_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// The `host:port` string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Finds `--config <path>` or `--config=<path>` in `args`.
fn config_path_from_args(args: &[String]) -> Result<Option<PathBuf>> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            match iter.next() {
                Some(path) => return Ok(Some(PathBuf::from(path))),
                None => bail!("--config needs a path"),
            }
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}
