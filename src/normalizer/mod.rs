use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use serde::Deserialize;

use crate::app::{PindownError, Result};
use crate::domain::Bookmark;

/// `posts/update` response body.
#[derive(Debug, Deserialize)]
struct UpdateResponse {
    update_time: String,
}

/// One entry of a `posts/all` response body.
#[derive(Debug, Deserialize)]
struct RawPost {
    href: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    extended: String,
    #[serde(default)]
    meta: String,
    #[serde(default)]
    hash: String,
    time: String,
    #[serde(default)]
    shared: String,
    #[serde(default)]
    toread: String,
    #[serde(default)]
    tags: String,
}

/// Converts Pinboard JSON responses into domain types.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse the collection's last-modified time.
    pub fn update_time(&self, body: &[u8]) -> Result<DateTime<Utc>> {
        let update: UpdateResponse = serde_json::from_slice(body)
            .map_err(|e| PindownError::ResponseParse(e.to_string()))?;
        parse_time(&update.update_time)
    }

    /// Parse a list of posts. Posts whose URL is not absolute or whose
    /// timestamp is unreadable are dropped.
    pub fn bookmarks(&self, body: &[u8]) -> Result<Vec<Bookmark>> {
        let posts: Vec<RawPost> = serde_json::from_slice(body)
            .map_err(|e| PindownError::ResponseParse(e.to_string()))?;

        let mut bookmarks = Vec::with_capacity(posts.len());
        for post in posts {
            if let Err(e) = url::Url::parse(&post.href) {
                tracing::warn!("Dropping bookmark with invalid URL '{}': {}", post.href, e);
                continue;
            }

            let created_at = match parse_time(&post.time) {
                Ok(created_at) => created_at,
                Err(e) => {
                    tracing::warn!("Dropping bookmark '{}': {}", post.href, e);
                    continue;
                }
            };
            let mut bookmark = Bookmark::new(
                post.href,
                decode_html_entities(&post.description).to_string(),
                created_at,
            );
            bookmark.extended = decode_html_entities(&post.extended).to_string();
            bookmark.tags = post.tags.split_whitespace().map(String::from).collect();
            bookmark.hash = post.hash;
            bookmark.meta = post.meta;
            bookmark.shared = post.shared != "no";
            bookmark.toread = post.toread == "yes";

            bookmarks.push(bookmark);
        }

        Ok(bookmarks)
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PindownError::ResponseParse(format!("bad timestamp '{}': {}", s, e)))
}
