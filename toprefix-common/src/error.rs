// toprefix-common/src/error.rs
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Pipeline stage a failed command belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Configure,
    Build,
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetch => "fetch",
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Install => "install",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone)]
pub enum ToprefixError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Catalog Error: {0}")]
    Catalog(String),

    #[error("Naming Error: no name/version rule matched '{0}'")]
    Naming(String),

    #[error("Unsupported Archive Format: '{0}' has no recognized archive suffix")]
    UnsupportedArchiveFormat(String),

    #[error(
        "Unexpected Archive Layout: '{archive}' unpacked to {entries} top-level entries, expected exactly one"
    )]
    UnexpectedArchiveLayout { archive: String, entries: usize },

    #[error("Download Error: failed to download '{package}' from '{url}': {reason}")]
    Download {
        package: String,
        url: String,
        reason: String,
    },

    #[error("Clone Error: 'git clone {url}' for '{package}' exited with {status}")]
    Clone {
        package: String,
        url: String,
        status: String,
    },

    #[error("Tool Not Found: '{0}' is required but was not found on PATH")]
    ToolNotFound(String),

    #[error("Build environment setup failed: {0}")]
    BuildEnv(String),

    #[error("Toolchain Discovery Error: {0}")]
    ToolchainDiscovery(String),

    #[error("Command Failed: [{package}] {stage}: `{command}` exited with {status}")]
    CommandFailed {
        package: String,
        stage: Stage,
        command: String,
        status: String,
    },

    #[error("Unknown Package: '{0}' not found in the catalog")]
    UnknownPackage(String),

    #[error("Unknown Spec: package '{package}': {detail}")]
    UnknownSpec { package: String, detail: String },
}

impl From<std::io::Error> for ToprefixError {
    fn from(err: std::io::Error) -> Self {
        ToprefixError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for ToprefixError {
    fn from(err: reqwest::Error) -> Self {
        ToprefixError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for ToprefixError {
    fn from(err: serde_json::Error) -> Self {
        ToprefixError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ToprefixError>;
