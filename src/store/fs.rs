//! Directory-backed sheet store.
//!
//! Each sheet lives in `{root}/sheets/{fingerprint}.json`. Records are
//! written to a temp file first and then hard-linked into place, so a record
//! is either absent or complete, and the link fails if another writer got
//! there first.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{InsertError, StoreError};
use crate::fingerprint::Fingerprint;
use crate::sheet::{SpriteSheet, current_timestamp};

use super::{SheetStore, attempt_id};

/// Records directory name (inside the store root)
pub(crate) const SHEETS_DIR: &str = "sheets";

/// Sheet store persisting one JSON document per fingerprint.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store under `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(SHEETS_DIR);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All stored fingerprints, sorted.
    pub fn list(&self) -> Result<Vec<Fingerprint>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let mut fingerprints: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| Fingerprint::from_hex(p.file_stem()?.to_str()?))
            .collect();
        fingerprints.sort();
        Ok(fingerprints)
    }

    fn record_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint.to_hex()))
    }

    fn read(&self, path: &Path) -> Result<Option<SpriteSheet>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Write a record to a fresh temp file next to its final location.
    fn write_temp(&self, sheet: &SpriteSheet) -> Result<PathBuf, StoreError> {
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            sheet.fingerprint.to_hex(),
            attempt_id()
        ));
        let json = serde_json::to_vec_pretty(sheet).map_err(|source| StoreError::Corrupt {
            path: tmp.clone(),
            source,
        })?;
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        Ok(tmp)
    }
}

impl SheetStore for FsStore {
    fn find(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        self.read(&self.record_path(fingerprint))
    }

    fn insert(&self, sheet: &SpriteSheet) -> Result<(), InsertError> {
        let path = self.record_path(&sheet.fingerprint);
        let tmp = self.write_temp(sheet)?;

        let linked = fs::hard_link(&tmp, &path);
        fs::remove_file(&tmp).ok();

        match linked {
            Ok(()) => {
                crate::debug!("store"; "wrote {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(InsertError::Conflict(sheet.fingerprint))
            }
            Err(e) => Err(StoreError::io(&path, e).into()),
        }
    }

    fn touch(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        let path = self.record_path(fingerprint);
        let Some(mut sheet) = self.read(&path)? else {
            return Ok(None);
        };

        sheet.updated_at = sheet.updated_at.max(current_timestamp());
        let tmp = self.write_temp(&sheet)?;
        fs::rename(&tmp, &path).map_err(|e| {
            fs::remove_file(&tmp).ok();
            StoreError::io(&path, e)
        })?;
        Ok(Some(sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::tests::sample_sheet;
    use tempfile::TempDir;

    #[test]
    fn test_insert_find_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let sheet = sample_sheet();

        assert!(store.find(&sheet.fingerprint).unwrap().is_none());
        store.insert(&sheet).unwrap();
        assert_eq!(store.find(&sheet.fingerprint).unwrap(), Some(sheet.clone()));

        // Reopening sees the same record
        let reopened = FsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.find(&sheet.fingerprint).unwrap(), Some(sheet));
    }

    #[test]
    fn test_duplicate_insert_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let sheet = sample_sheet();
        store.insert(&sheet).unwrap();

        let err = store.insert(&sheet).unwrap_err();
        assert!(matches!(err, InsertError::Conflict(_)));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let sheet = sample_sheet();
        store.insert(&sheet).unwrap();
        store.insert(&sheet).unwrap_err();
        store.touch(&sheet.fingerprint).unwrap();

        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, [format!("{}.json", sheet.fingerprint.to_hex())]);
    }

    #[test]
    fn test_touch_persists() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let sheet = sample_sheet();
        store.insert(&sheet).unwrap();

        let touched = store.touch(&sheet.fingerprint).unwrap().unwrap();
        assert!(touched.updated_at > sheet.updated_at);
        let stored = store.find(&sheet.fingerprint).unwrap().unwrap();
        assert_eq!(stored.updated_at, touched.updated_at);
        assert_eq!(stored.created_at, sheet.created_at);
    }

    #[test]
    fn test_corrupt_record() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let fp = Fingerprint::new([3; 32]);
        fs::write(store.record_path(&fp), "{ not json").unwrap();

        let err = store.find(&fp).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_list() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        let a = sample_sheet();
        let mut b = sample_sheet();
        b.fingerprint = Fingerprint::new([1; 32]);
        store.insert(&a).unwrap();
        store.insert(&b).unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), [b.fingerprint, a.fingerprint]);
    }
}
