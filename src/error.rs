//! Error types for the configuration, parse and update layers.
//!
//! The cache, health tracker and version comparator never fail, so they have
//! no error type of their own.

use thiserror::Error;

/// Errors raised while loading or saving the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Config file parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by a parse request.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No video URL given")]
    EmptyUrl,

    #[error("URL must start with http:// or https://: {0}")]
    InvalidScheme(String),

    #[error("URL does not belong to a supported video site: {0}")]
    UnsupportedSite(String),

    #[error("No parse line available")]
    NoEndpoint,

    #[error("Unknown parse line: {0}")]
    UnknownEndpoint(String),

    #[error("Failed to open browser: {0}")]
    Launch(#[from] std::io::Error),
}

/// Errors raised while checking for or applying an update.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Update server returned status {0}")]
    Status(u16),

    #[error("Invalid update manifest: {0}")]
    Manifest(String),

    #[error("Update manifest has no download URL")]
    MissingDownloadUrl,

    #[error("Failed to open download link: {0}")]
    Launch(std::io::Error),

    #[error("Failed to write local version file {path}: {source}")]
    VersionFile {
        path: String,
        source: std::io::Error,
    },
}
