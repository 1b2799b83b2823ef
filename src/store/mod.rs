pub mod file;

use crate::app::Result;
use crate::domain::SyncState;

pub use file::FileStateStore;

/// Persistence for the sync marker and the settings stored with it.
pub trait StateStore {
    /// Read the persisted state. Fails when there is no usable credential.
    fn load(&self) -> Result<SyncState>;

    /// Replace the persisted state as a whole. On failure the previous
    /// state is left as it was.
    fn save(&self, state: &SyncState) -> Result<()>;
}
