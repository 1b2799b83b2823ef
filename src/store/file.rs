use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::app::{PindownError, Result};
use crate::domain::{ApiToken, SyncState};
use crate::store::StateStore;

/// On-disk shape of the state file. Everything is optional here so that
/// validation can tell a missing credential apart from a broken file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_tz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_import: Option<toml::Value>,
    #[serde(flatten)]
    extra: toml::Table,
}

/// TOML-backed [`StateStore`].
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `~/.config/pindown/state.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PindownError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("pindown").join("state.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_last_import(value: &toml::Value) -> Option<DateTime<Utc>> {
        let raw = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Datetime(dt) => dt.to_string(),
            _ => return None,
        };
        parse_datetime(&raw)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| s.parse::<DateTime<Utc>>().ok())
        // No offset at all: the remote only ever speaks UTC.
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<SyncState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PindownError::StateNotFound(self.path.clone()))
            }
            Err(e) => return Err(PindownError::Io(e)),
        };

        let file: StateFile = toml::from_str(&content).map_err(|e| PindownError::StateParse {
            path: self.path.clone(),
            source: e,
        })?;

        let api_token = ApiToken::new(file.api_token.unwrap_or_default())?;

        let last_import = match file.last_import {
            Some(value) => {
                let parsed = Self::parse_last_import(&value);
                if parsed.is_none() {
                    tracing::warn!(
                        "Ignoring malformed last_import {} in {}",
                        value,
                        self.path.display()
                    );
                }
                parsed
            }
            None => None,
        };

        let local_tz = file.local_tz.filter(|tz| !tz.trim().is_empty());

        tracing::debug!("Sync state loaded from {}", self.path.display());

        Ok(SyncState {
            last_import,
            local_tz,
            api_token,
            extra: file.extra,
        })
    }

    fn save(&self, state: &SyncState) -> Result<()> {
        let save_err = |source: io::Error| PindownError::StateSave {
            path: self.path.clone(),
            source,
        };

        let file = StateFile {
            api_token: Some(state.api_token.expose().to_string()),
            local_tz: state.local_tz.clone(),
            last_import: state
                .last_import
                .map(|dt| toml::Value::String(dt.to_rfc3339())),
            extra: state.extra.clone(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| save_err(io::Error::other(e)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(save_err)?;

        // Write next to the target, then rename over it.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(save_err)?;
        tmp.write_all(content.as_bytes()).map_err(save_err)?;
        tmp.as_file().sync_all().map_err(save_err)?;
        tmp.persist(&self.path).map_err(|e| save_err(e.error))?;

        tracing::debug!("Sync state saved to {}", self.path.display());
        Ok(())
    }
}
