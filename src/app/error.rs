use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PindownError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Response parsing error: {0}")]
    ResponseParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Can not write to '{path}': {source}")]
    OutputNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Sync state not found at {0}")]
    StateNotFound(PathBuf),

    #[error("Failed to parse sync state at {path}: {source}")]
    StateParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to save sync state to {path}: {source}")]
    StateSave {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No API token in sync state")]
    MissingCredential,

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Timezone error: {0}")]
    Timezone(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PindownError>;
