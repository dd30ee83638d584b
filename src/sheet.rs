//! Sprite sheet records and request types.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::SpriteError;
use crate::fingerprint::Fingerprint;

// ============================================================================
// ImageMap
// ============================================================================

/// Ordered identifier → source path list.
///
/// Order is layout order: the first entry lands at `x = 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMap {
    entries: Vec<(String, PathBuf)>,
}

impl ImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry (builder style).
    pub fn with(mut self, identifier: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.push(identifier, path);
        self
    }

    pub fn push(&mut self, identifier: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.push((identifier.into(), path.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(id, p)| (id.as_str(), p.as_path()))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Reject empty maps, blank identifiers and duplicates.
    pub fn validate(&self) -> Result<(), SpriteError> {
        if self.entries.is_empty() {
            return Err(SpriteError::validation("image map is empty"));
        }

        let mut seen = FxHashSet::default();
        for (id, _) in &self.entries {
            if id.is_empty() {
                return Err(SpriteError::validation("identifier must not be empty"));
            }
            if !seen.insert(id.as_str()) {
                return Err(SpriteError::validation(format!(
                    "duplicate identifier `{id}`"
                )));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, P: Into<PathBuf>> FromIterator<(K, P)> for ImageMap {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, path)| (id.into(), path.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, P: Into<PathBuf>> From<std::collections::BTreeMap<K, P>> for ImageMap {
    fn from(map: std::collections::BTreeMap<K, P>) -> Self {
        map.into_iter().collect()
    }
}

// ============================================================================
// Positions
// ============================================================================

/// Where one source image sits on the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub identifier: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Position {
    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }
}

/// Position table of a sheet, in layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Positions(Vec<Position>);

impl Positions {
    pub fn new(positions: Vec<Position>) -> Self {
        Self(positions)
    }

    pub fn get(&self, identifier: &str) -> Option<&Position> {
        self.0.iter().find(|p| p.identifier == identifier)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Position> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Positions {
    type Item = &'a Position;
    type IntoIter = std::slice::Iter<'a, Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Attachment
// ============================================================================

/// Reference to the stored sheet image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Backend key (file name for filesystem storage).
    pub key: String,
    pub content_type: String,
    pub byte_size: u64,
}

// ============================================================================
// SpriteSheet
// ============================================================================

/// A composed sheet plus its position table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub fingerprint: Fingerprint,
    pub positions: Positions,
    pub image: Attachment,
    pub width: u32,
    pub height: u32,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Unix timestamp in seconds, bumped on every cache hit
    pub updated_at: u64,
}

impl SpriteSheet {
    /// Look up one identifier's placement.
    pub fn position(&self, identifier: &str) -> Option<&Position> {
        self.positions.get(identifier)
    }

    /// Check a record before it is written.
    ///
    /// Requires fingerprint, positions and image to be present, and the
    /// canvas size to match the placements.
    pub fn validate(&self) -> Result<(), SpriteError> {
        if self.fingerprint.is_empty() {
            return Err(SpriteError::validation("fingerprint is blank"));
        }
        if self.positions.is_empty() {
            return Err(SpriteError::validation("positions are blank"));
        }
        if self.image.key.is_empty() || self.image.byte_size == 0 {
            return Err(SpriteError::validation("image is blank"));
        }
        if !self.image.content_type.starts_with("image/") {
            return Err(SpriteError::validation(format!(
                "image has content type `{}`, expected image/*",
                self.image.content_type
            )));
        }

        let mut expected_x = 0u64;
        let mut max_height = 0u32;
        for p in &self.positions {
            if p.y != 0 || u64::from(p.x) != expected_x {
                return Err(SpriteError::validation(format!(
                    "`{}` is not placed at ({expected_x}, 0)",
                    p.identifier
                )));
            }
            if p.width == 0 || p.height == 0 {
                return Err(SpriteError::validation(format!(
                    "`{}` has an empty size",
                    p.identifier
                )));
            }
            expected_x = p.right();
            max_height = max_height.max(p.height);
        }

        if expected_x != u64::from(self.width) || max_height != self.height {
            return Err(SpriteError::validation(format!(
                "sheet is {}x{} but placements span {expected_x}x{max_height}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Get current Unix timestamp in seconds
pub(crate) fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
