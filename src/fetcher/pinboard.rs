use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use url::Url;

use crate::app::Result;
use crate::config::PinboardConfig;
use crate::domain::{ApiToken, Bookmark};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

/// Pinboard v1 API client.
pub struct PinboardFetcher {
    client: Client,
    base_url: Url,
    token: ApiToken,
    normalizer: Normalizer,
}

impl PinboardFetcher {
    pub fn new(config: &PinboardConfig, token: ApiToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("pindown/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Trailing slash so that `join` appends instead of replacing.
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;

        Ok(Self {
            client,
            base_url,
            token,
            normalizer: Normalizer::new(),
        })
    }

    fn endpoint(&self, method: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(method)?;
        url.query_pairs_mut()
            .append_pair("auth_token", self.token.expose())
            .append_pair("format", "json")
            .extend_pairs(params);
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        let response = response.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

impl Fetcher for PinboardFetcher {
    fn last_modified(&self) -> Result<DateTime<Utc>> {
        let body = self.get(self.endpoint("posts/update", &[])?)?;
        self.normalizer.update_time(&body)
    }

    fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Bookmark>> {
        let fromdt = since.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let body = self.get(self.endpoint("posts/all", &[("fromdt", &fromdt)])?)?;

        let mut bookmarks = self.normalizer.bookmarks(&body)?;
        // fromdt has second precision; drop anything before the window.
        bookmarks.retain(|b| b.created_at >= since);
        tracing::debug!("Fetched {} bookmarks since {}", bookmarks.len(), fromdt);
        Ok(bookmarks)
    }
}
