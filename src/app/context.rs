use std::path::Path;

use chrono_tz::Tz;

use crate::app::error::Result;
use crate::config::RunConfig;
use crate::domain::{parse_timezone, SyncState};
use crate::fetcher::{Fetcher, PinboardFetcher};
use crate::pipeline::{self, Pipeline};
use crate::slug::StopwordSet;
use crate::store::{FileStateStore, StateStore};
use crate::template;

pub struct AppContext {
    pub state: SyncState,
    pub store: Box<dyn StateStore>,
    pub fetcher: Box<dyn Fetcher>,
    pub pipeline: Pipeline,
}

impl AppContext {
    /// Check the output directory, load the sync state and build the
    /// Pinboard client. Any failure here is fatal for the run.
    pub fn new(config: &RunConfig) -> Result<Self> {
        pipeline::ensure_writable(&config.output_dir)?;

        let store = FileStateStore::new(&config.state_path);
        tracing::debug!("Sync state file: {}", store.path().display());
        let state = store.load()?;
        let fetcher = PinboardFetcher::new(&config.pinboard, state.api_token.clone())?;

        Ok(Self::with_parts(
            config,
            state,
            Box::new(store),
            Box::new(fetcher),
        ))
    }

    /// Assemble a context from already-loaded parts. Optional resources
    /// (stopwords, template, timezone) fall back to defaults here.
    pub fn with_parts(
        config: &RunConfig,
        state: SyncState,
        store: Box<dyn StateStore>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        let stopwords = load_stopwords(&config.stopwords_path);
        let template = template::resolve_or_default(&config.template_path);
        tracing::debug!("Using {} template", template.source());
        let timezone = resolve_timezone(config.timezone.as_deref(), &state);
        tracing::info!("Local timezone: {}", timezone);

        let pipeline = Pipeline::new(
            &config.output_dir,
            template,
            stopwords,
            timezone,
            config.slug_max_length,
            config.debug,
        );

        Self {
            state,
            store,
            fetcher,
            pipeline,
        }
    }
}

fn load_stopwords(path: &Path) -> StopwordSet {
    match StopwordSet::load(path) {
        Ok(stopwords) if stopwords.is_empty() => {
            tracing::warn!("Stopword file '{}' is empty", path.display());
            stopwords
        }
        Ok(stopwords) => {
            tracing::debug!(
                "Loaded {} stopwords from '{}'",
                stopwords.len(),
                path.display()
            );
            stopwords
        }
        Err(e) => {
            let stopwords = StopwordSet::builtin();
            tracing::warn!(
                "Could not load stopwords from '{}' ({}), using {} built-in stopwords",
                path.display(),
                e,
                stopwords.len()
            );
            stopwords
        }
    }
}

/// `--timezone` if valid, else the persisted zone, else UTC.
fn resolve_timezone(custom: Option<&str>, state: &SyncState) -> Tz {
    if let Some(name) = custom {
        match parse_timezone(name) {
            Ok(tz) => return tz,
            Err(e) => tracing::warn!("Could not assign custom timezone: {}", e),
        }
    }

    match state.timezone() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::warn!("{}, falling back to UTC", e);
            Tz::UTC
        }
    }
}
