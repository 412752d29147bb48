//! Configuration loading for `regexlab.toml`.
//!
//! The binary passes an explicit path (`--config`) or lets `discover` pick one:
//! the working directory first, then the platform config dir. A missing file
//! yields defaults silently; a file that fails to parse yields defaults and a
//! `config` warning so a typo never blocks a session. Unknown fields are
//! ignored.
//!
//! ```toml
//! [engine]
//! kind = "linear"
//! backtrack_limit = 250000
//!
//! [history]
//! max_depth = 500
//! ```

use anyhow::Result;
use core_pattern::{DEFAULT_BACKTRACK_LIMIT, EngineKind, EngineOptions};
use serde::Deserialize;
use std::{fs, io, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "regexlab.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,
    #[serde(default = "EngineConfig::default_backtrack_limit")]
    pub backtrack_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            backtrack_limit: Self::default_backtrack_limit(),
        }
    }
}

impl EngineConfig {
    const fn default_backtrack_limit() -> usize {
        DEFAULT_BACKTRACK_LIMIT
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Omitted keeps every pattern edit.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source: Option<PathBuf>, // file the values came from, if any
    pub file: ConfigFile,
}

impl Config {
    pub fn engine_options(&self) -> EngineOptions {
        let engine = &self.file.engine;
        // A zero budget would fail every backtracking search outright.
        let backtrack_limit = if engine.backtrack_limit == 0 {
            DEFAULT_BACKTRACK_LIMIT
        } else {
            engine.backtrack_limit
        };
        EngineOptions {
            kind: engine.kind,
            backtrack_limit,
        }
    }

    pub fn history_max_depth(&self) -> Option<usize> {
        self.file.history.max_depth
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("regexlab").join(CONFIG_FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!(target: "config", file = %path.display(), "config_absent_using_defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            warn!(target: "config", file = %path.display(), error = %e, "config_unreadable_using_defaults");
            return Ok(Config::default());
        }
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(
                target: "config",
                file = %path.display(),
                engine = ?file.engine.kind,
                backtrack_limit = file.engine.backtrack_limit,
                history_max_depth = ?file.history.max_depth,
                "config_loaded"
            );
            Ok(Config {
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", file = %path.display(), error = %e.message(), "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}
