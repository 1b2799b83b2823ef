pub mod pinboard;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::Bookmark;

pub use pinboard::PinboardFetcher;

/// Read access to the remote bookmark collection. All timestamps are UTC.
pub trait Fetcher {
    /// When the collection last changed.
    fn last_modified(&self) -> Result<DateTime<Utc>>;

    /// Bookmarks created at or after `since`, in no particular order.
    fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Bookmark>>;
}

/// What a run has to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// Nothing changed since `since`.
    UpToDate { since: DateTime<Utc> },
    /// Fetch everything from `since`; `until` becomes the next `last_import`.
    Fetch {
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    },
}

/// Decide whether the remote has anything new.
///
/// Without a previous import the window starts at `now`: bookmarks made
/// before the first run are never pulled in.
pub fn plan(
    last_import: Option<DateTime<Utc>>,
    remote_last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Delta {
    let since = last_import.unwrap_or(now);
    if remote_last_modified <= since {
        Delta::UpToDate { since }
    } else {
        Delta::Fetch {
            since,
            until: remote_last_modified,
        }
    }
}
