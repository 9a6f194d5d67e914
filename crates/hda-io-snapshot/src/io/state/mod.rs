//! Tag-length-value snapshot container.
//!
//! A blob is a fixed header (format magic and version, device id, device version) followed by
//! fields in ascending tag order. Readers skip tags they do not know, so a device may add fields
//! within a major version without breaking older readers.

mod version;

pub use version::{
    codec, SnapshotError, SnapshotHeader, SnapshotReader, SnapshotResult, SnapshotVersion,
    SnapshotWriter, SNAPSHOT_FORMAT_MAGIC, SNAPSHOT_FORMAT_VERSION,
};

/// A device record that can be written to and read back from a snapshot blob.
///
/// `DEVICE_ID` never changes once published. Bumping the major `DEVICE_VERSION` is how a record
/// signals a layout that older readers must reject.
pub trait IoSnapshot {
    const DEVICE_ID: [u8; 4];
    const DEVICE_VERSION: SnapshotVersion;

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;

    /// Decode a fresh record from `bytes`.
    fn decode(bytes: &[u8]) -> SnapshotResult<Self>
    where
        Self: Default + Sized,
    {
        let mut state = Self::default();
        state.load_state(bytes)?;
        Ok(state)
    }
}
