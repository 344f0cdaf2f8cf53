//! Optional watcher configuration (`mondot.toml` in the scripts
//! directory).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// File name probed at the root of the scripts directory.
const CONFIG_FILE: &str = "mondot.toml";

/// The `[watch]` section of `mondot.toml`, with defaults matching the
/// bare runtime: the three script extensions, no exclusions, 400 ms
/// poll.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Glob patterns for files to compile.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns for files to skip.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Watcher poll interval in milliseconds.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    watch: Option<ScanConfig>,
}

fn default_include() -> Vec<String> {
    vec![
        "**/*.mdot".to_string(),
        "**/*.mondot".to_string(),
        "**/*.mon".to_string(),
    ]
}

fn default_poll_ms() -> u64 {
    400
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            poll_ms: default_poll_ms(),
        }
    }
}

impl ScanConfig {
    /// Load the configuration for a scripts directory. A missing
    /// `mondot.toml` is not an error; it just means defaults.
    pub fn load(scripts_dir: &Path) -> Result<Self, ConfigError> {
        let path = scripts_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&content, &path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: e,
        })?;
        Ok(file.watch.unwrap_or_default())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}
