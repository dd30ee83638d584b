//! Sheet fingerprints using blake3.
//!
//! A fingerprint identifies one sprite sheet. By default it is derived from
//! the sorted identifier set only, so the same identifiers always map to the
//! same sheet regardless of what the files currently contain.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::sheet::ImageMap;

/// Separator placed between sorted identifiers before hashing.
const SEPARATOR: &str = "-";

/// A 256-bit sheet fingerprint (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create a new Fingerprint from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the all-zero fingerprint.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        if bytes.len() != 32 {
            return None;
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Some(Self(arr))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fingerprint `{s}`")))
    }
}

/// What goes into a fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Sorted identifiers only. Changing an image's bytes under an existing
    /// identifier set returns the previously composed sheet.
    #[default]
    Identifiers,
    /// Sorted identifiers plus the blake3 hash of every source file.
    Content,
}

/// Fingerprint of the sorted identifier set, joined with `-`.
pub fn identifiers_fingerprint<'a>(identifiers: impl IntoIterator<Item = &'a str>) -> Fingerprint {
    let mut ids: Vec<&str> = identifiers.into_iter().collect();
    ids.sort_unstable();
    let joined = ids.join(SEPARATOR);
    Fingerprint::new(*blake3::hash(joined.as_bytes()).as_bytes())
}

/// Compute the fingerprint of an image map under the given mode.
///
/// Content mode reads every source file; a file that cannot be read is
/// reported against its path.
pub fn compute(images: &ImageMap, mode: FingerprintMode) -> Result<Fingerprint, (String, io::Error)> {
    let ids = identifiers_fingerprint(images.identifiers());
    match mode {
        FingerprintMode::Identifiers => Ok(ids),
        FingerprintMode::Content => {
            let mut entries: Vec<_> = images.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            let mut hasher = blake3::Hasher::new();
            hasher.update(ids.as_bytes());
            for (_, path) in entries {
                let hash = file_hash(path).map_err(|e| (path.display().to_string(), e))?;
                hasher.update(&hash);
            }
            Ok(Fingerprint::new(*hasher.finalize().as_bytes()))
        }
    }
}

/// Streaming blake3 hash of a file's contents.
fn file_hash(path: &Path) -> io::Result<[u8; 32]> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(*hasher.finalize().as_bytes())
}
