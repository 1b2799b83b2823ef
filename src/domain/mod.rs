pub mod bookmark;
pub mod state;

pub use bookmark::Bookmark;
pub use state::{parse_timezone, ApiToken, SyncState};
