use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::checker::evaluator::DEFAULT_JQ_PROGRAM;
use crate::checker::remote::DEFAULT_GIT_PROGRAM;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a whole check of one record in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Delay between starting each check to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// User agent sent with document requests
pub const DEFAULT_USER_AGENT: &str = "json-version-checker";

/// Checker configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    /// jq executable used to evaluate queries
    pub jq_path: PathBuf,
    /// git executable used to resolve tags
    pub git_path: PathBuf,
    /// Per-record check timeout in milliseconds
    pub fetch_timeout: u64,
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            jq_path: PathBuf::from(DEFAULT_JQ_PROGRAM),
            git_path: PathBuf::from(DEFAULT_GIT_PROGRAM),
            fetch_timeout: FETCH_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckerConfig {
    /// Loads the configuration from a JSON file; missing fields use defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Returns the path to the data directory for json-version-checker.
/// Uses $XDG_DATA_HOME/json-version-checker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/json-version-checker,
/// or ./json-version-checker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("json-version-checker.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("json-version-checker")
}
