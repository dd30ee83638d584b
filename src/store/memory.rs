//! In-process sheet store.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{InsertError, StoreError};
use crate::fingerprint::Fingerprint;
use crate::sheet::{SpriteSheet, current_timestamp};

use super::SheetStore;

/// Thread-safe in-memory sheet store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: DashMap<Fingerprint, SpriteSheet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl SheetStore for MemoryStore {
    fn find(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        Ok(self.sheets.get(fingerprint).map(|r| r.clone()))
    }

    fn insert(&self, sheet: &SpriteSheet) -> Result<(), InsertError> {
        match self.sheets.entry(sheet.fingerprint) {
            Entry::Occupied(_) => Err(InsertError::Conflict(sheet.fingerprint)),
            Entry::Vacant(slot) => {
                slot.insert(sheet.clone());
                Ok(())
            }
        }
    }

    fn touch(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, StoreError> {
        Ok(self.sheets.get_mut(fingerprint).map(|mut r| {
            r.updated_at = r.updated_at.max(current_timestamp());
            r.clone()
        }))
    }
}
