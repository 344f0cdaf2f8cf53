use std::path::PathBuf;

use mondot_lang::{CompileError, ParseError};
use thiserror::Error;

/// Errors from reading the optional `mondot.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from loading script files. All are non-fatal to the
/// process: the watcher reports them and keeps the prior module
/// versions published.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
