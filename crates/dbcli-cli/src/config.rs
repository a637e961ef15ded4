//! Shared configuration for both clients.
//!
//! Looked up from `--config`, then `$DBCLI_CONFIG`, then `./dbcli.toml`;
//! when none exists the defaults apply. Command-line flags override values
//! read from the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "DBCLI_CONFIG";

/// Configuration file looked for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dbcli.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store snapshot files.
    pub data_dir: PathBuf,
    /// Editor command; falls back to `$VISUAL`, `$EDITOR`, then `vi`.
    pub editor: Option<String>,
    /// Log level used when `-v` is not given.
    pub log_level: Option<String>,
    pub kv: KvConfig,
    pub doc: DocConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".dbcli"),
            editor: None,
            log_level: None,
            kv: KvConfig::default(),
            doc: DocConfig::default(),
        }
    }
}

/// Key-value client settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvConfig {
    /// Logical database number.
    pub db: u32,
}

/// Document client settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocConfig {
    pub database: Option<String>,
    pub collection: Option<String>,
}

impl Config {
    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parsing config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Which file to load, if any.
    pub fn locate(explicit: Option<&Path>, env: Option<PathBuf>, working_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            return Some(path);
        }
        let local = working_dir.join(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    /// Load the configuration for this process.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match Self::locate(explicit, env, Path::new(".")) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }
}
