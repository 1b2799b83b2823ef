//! Configuration management for pindown.
//!
//! Settings are read from `~/.config/pindown/config.toml` (or `--config`).
//! The file is optional and every field has a default. Command-line flags
//! are layered on top to build the [`RunConfig`] handed to each component.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::{PindownError, Result};
use crate::cli::Cli;
use crate::store::FileStateStore;

pub const DEFAULT_STOPWORDS_PATH: &str = "stopwords.txt";
pub const DEFAULT_TEMPLATE_PATH: &str = "template.md";
pub const DEFAULT_SLUG_MAX_LENGTH: usize = 32;
pub const DEFAULT_PINBOARD_URL: &str = "https://api.pinboard.in/v1";

/// Pinboard API client options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinboardConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for PinboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PINBOARD_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the sync state lives (default: `~/.config/pindown/state.toml`)
    pub state_file: Option<PathBuf>,

    /// Stopword list, one word per line
    pub stopwords: PathBuf,

    /// Jinja template for output files
    pub template: PathBuf,

    /// Maximum slug length in characters; 0 disables the limit
    pub slug_max_length: usize,

    pub pinboard: PinboardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_file: None,
            stopwords: PathBuf::from(DEFAULT_STOPWORDS_PATH),
            template: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            slug_max_length: DEFAULT_SLUG_MAX_LENGTH,
            pinboard: PinboardConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the default location when `None`.
    ///
    /// A missing file yields defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| {
            PindownError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// `~/.config/pindown/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PindownError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join("pindown").join("config.toml"))
    }
}

/// Everything a single run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Dry run: render everything, write nothing, keep the state.
    pub debug: bool,
    pub stopwords_path: PathBuf,
    pub template_path: PathBuf,
    /// Zone name from `--timezone`, takes precedence over the persisted one.
    pub timezone: Option<String>,
    pub state_path: PathBuf,
    pub slug_max_length: usize,
    pub pinboard: PinboardConfig,
}

impl RunConfig {
    pub fn new(output_dir: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        let settings = Settings::default();
        Self {
            output_dir: output_dir.into(),
            debug: false,
            stopwords_path: settings.stopwords,
            template_path: settings.template,
            timezone: None,
            state_path: state_path.into(),
            slug_max_length: settings.slug_max_length,
            pinboard: settings.pinboard,
        }
    }

    /// Layer command-line flags over the settings file.
    pub fn from_cli(cli: &Cli, settings: Settings) -> Result<Self> {
        let state_path = match (&cli.state, settings.state_file) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => path,
            (None, None) => FileStateStore::default_path()?,
        };

        Ok(Self {
            output_dir: cli.output.clone(),
            debug: cli.debug,
            stopwords_path: cli.stopwords.clone().unwrap_or(settings.stopwords),
            template_path: cli.template.clone().unwrap_or(settings.template),
            timezone: cli.timezone.clone(),
            state_path,
            slug_max_length: settings.slug_max_length,
            pinboard: settings.pinboard,
        })
    }
}
