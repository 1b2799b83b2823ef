use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::app::{PindownError, Result};

/// Opaque Pinboard credential (`user:TOKEN`).
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(PindownError::MissingCredential);
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep the user part, it is handy in logs.
        match self.0.split_once(':') {
            Some((user, _)) => write!(f, "ApiToken({}:***)", user),
            None => f.write_str("ApiToken(***)"),
        }
    }
}

/// How far synchronization has progressed, plus the settings persisted
/// alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// Remote last-modified time of the last completed import, in UTC.
    pub last_import: Option<DateTime<Utc>>,
    /// IANA zone name used for `local_date` in rendered documents.
    pub local_tz: Option<String>,
    pub api_token: ApiToken,
    /// Keys this version does not know about, written back untouched.
    pub extra: toml::Table,
}

impl SyncState {
    pub fn new(api_token: ApiToken) -> Self {
        Self {
            last_import: None,
            local_tz: None,
            api_token,
            extra: toml::Table::new(),
        }
    }

    /// Parse the persisted zone name.
    pub fn timezone(&self) -> Result<Tz> {
        match self.local_tz.as_deref() {
            Some(name) => parse_timezone(name),
            None => Err(PindownError::Timezone("local_tz is not set".into())),
        }
    }

    /// Copy of this state with `last_import` advanced to `at`.
    pub fn advanced_to(&self, at: DateTime<Utc>) -> Self {
        Self {
            last_import: Some(at),
            ..self.clone()
        }
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| PindownError::Timezone(format!("{} ({})", name, e)))
}
