//! Sheet records and attachment storage.
//!
//! | Module       | Purpose                                            |
//! |--------------|----------------------------------------------------|
//! | `memory`     | In-process record store (`DashMap`)                |
//! | `fs`         | One JSON record per fingerprint on disk            |
//! | `attachment` | Sheet image bytes (filesystem / in-memory) + URLs  |

mod attachment;
mod fs;
mod memory;

pub use attachment::{AttachmentStore, FsAttachments, MemoryAttachments};
pub use fs::FsStore;
pub use memory::MemoryStore;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{InsertError, StoreError};
use crate::fingerprint::Fingerprint;
use crate::sheet::SpriteSheet;

/// Persistent sprite sheet records, unique by fingerprint.
pub trait SheetStore: Send + Sync {
    /// Fetch a sheet without modifying it.
    fn find(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError>;

    /// Insert a new sheet.
    ///
    /// Must fail with [`InsertError::Conflict`] when a sheet with the same
    /// fingerprint exists, even when racing another insert.
    fn insert(&self, sheet: &SpriteSheet) -> Result<(), InsertError>;

    /// Bump `updated_at` and return the sheet, if present.
    fn touch(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError>;
}

impl<T: SheetStore + ?Sized> SheetStore for std::sync::Arc<T> {
    fn find(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        (**self).find(fingerprint)
    }

    fn insert(&self, sheet: &SpriteSheet) -> Result<(), InsertError> {
        (**self).insert(sheet)
    }

    fn touch(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        (**self).touch(fingerprint)
    }
}

/// Per-process sequence for temp files and attachment keys.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Short id unique to this write attempt (process, time, sequence).
pub(crate) fn attempt_id() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&seq.to_le_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_attempt_ids_are_unique() {
        let ids: FxHashSet<_> = (0..1000).map(|_| attempt_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.len() == 12));
    }
}
