//! Configuration for the clusterterm console.
//!
//! Settings are layered: `~/.clusterterm/config.toml`, then `.env`/environment
//! (through the CLI's `env` fallbacks), then command-line flags.
//!
//! ```toml
//! server = "https://cluster.example.com/api/v1"
//!
//! [resize]
//! debounce_ms = 50
//!
//! [session]
//! detach_key = 29  # Ctrl-]
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clusterterm_terminal::{TerminalEndpoint, DEFAULT_RESIZE_DEBOUNCE_MS};

use crate::cli::Cli;

/// Byte that ends an interactive session locally (Ctrl-])
pub const DEFAULT_DETACH_KEY: u8 = 0x1d;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Cluster API base URL
    pub server: Option<String>,
    /// API prefix, overriding the path of `server`
    pub api_prefix: Option<String>,
    pub resize: ResizeConfig,
    pub session: SessionConfig,
}

/// Resize debounce settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub debounce_ms: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
        }
    }
}

/// Interactive session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub detach_key: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            detach_key: DEFAULT_DETACH_KEY,
        }
    }
}

impl Config {
    /// `~/.clusterterm/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(|home| PathBuf::from(home).join(".clusterterm").join("config.toml"))
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load from `--config` if given, else from the default location
    pub fn load_for(cli: &Cli) -> Result<Self> {
        match cli.config.as_deref() {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }
}

/// Effective settings after layering config and CLI
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: TerminalEndpoint,
    pub debounce: Duration,
    pub detach_key: u8,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Result<Self> {
        let server = cli
            .server
            .clone()
            .or(config.server)
            .filter(|s| !s.trim().is_empty());
        let Some(server) = server else {
            bail!("No server configured. Pass --server, set CLUSTERTERM_SERVER, or add `server` to the config file");
        };

        let mut endpoint = TerminalEndpoint::from_base_url(server.trim())
            .with_context(|| format!("Invalid server URL '{}'", server))?;
        if let Some(prefix) = cli.api_prefix.as_deref().or(config.api_prefix.as_deref()) {
            endpoint = endpoint.with_api_prefix(prefix);
        }

        Ok(Self {
            endpoint,
            debounce: Duration::from_millis(config.resize.debounce_ms),
            detach_key: config.session.detach_key,
        })
    }
}
