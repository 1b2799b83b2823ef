use chrono::{DateTime, Utc};

/// A single bookmark as returned by the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub description: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub extended: String,
    pub hash: String,
    pub meta: String,
    pub shared: bool,
    pub toread: bool,
}

impl Bookmark {
    pub fn new(url: impl Into<String>, description: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            url: url.into(),
            created_at,
            tags: Vec::new(),
            extended: String::new(),
            hash: String::new(),
            meta: String::new(),
            shared: true,
            toread: false,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.url
        } else {
            &self.description
        }
    }
}
