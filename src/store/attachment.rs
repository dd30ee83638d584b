//! Sheet image storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::StoreError;
use crate::sheet::Attachment;

use super::attempt_id;

/// Images directory name (inside the store root)
pub(crate) const IMAGES_DIR: &str = "images";

/// Characters escaped in attachment URLs.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Binary storage for composed sheet images.
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` under `key`, replacing nothing: keys are unique per build.
    fn store(&self, key: &str, bytes: &[u8], content_type: &str)
    -> Result<Attachment, StoreError>;

    /// Read the stored bytes back.
    fn read(&self, attachment: &Attachment) -> Result<Vec<u8>, StoreError>;

    /// Retrievable address of the stored bytes.
    fn url(&self, attachment: &Attachment) -> String;

    /// Delete stored bytes. Missing attachments are not an error.
    fn remove(&self, attachment: &Attachment) -> Result<(), StoreError>;
}

fn check_key(key: &str) -> Result<(), StoreError> {
    let plain = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && Path::new(key).file_name().is_some_and(|n| n == key);
    if plain {
        Ok(())
    } else {
        Err(StoreError::Backend(format!(
            "attachment key `{key}` is not a plain file name"
        )))
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Attachments stored as files in `{root}/images`, served under a URL prefix.
#[derive(Debug, Clone)]
pub struct FsAttachments {
    dir: PathBuf,
    url_prefix: String,
}

impl FsAttachments {
    /// Open (and create if needed) attachment storage under `root`.
    pub fn open(root: impl AsRef<Path>, url_prefix: impl Into<String>) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(IMAGES_DIR);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            url_prefix: url_prefix.into(),
        })
    }

    /// Directory holding the images.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Filesystem path of a stored attachment.
    pub fn path(&self, attachment: &Attachment) -> PathBuf {
        self.dir.join(&attachment.key)
    }
}

impl AttachmentStore for FsAttachments {
    fn store(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Attachment, StoreError> {
        check_key(key)?;

        let path = self.dir.join(key);
        let tmp = self.dir.join(format!(".{key}.{}.tmp", attempt_id()));
        fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            fs::remove_file(&tmp).ok();
            StoreError::io(&path, e)
        })?;

        Ok(Attachment {
            key: key.to_string(),
            content_type: content_type.to_string(),
            byte_size: bytes.len() as u64,
        })
    }

    fn read(&self, attachment: &Attachment) -> Result<Vec<u8>, StoreError> {
        let path = self.path(attachment);
        fs::read(&path).map_err(|e| StoreError::io(path, e))
    }

    fn url(&self, attachment: &Attachment) -> String {
        let key = utf8_percent_encode(&attachment.key, KEY_ESCAPE);
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), key)
    }

    fn remove(&self, attachment: &Attachment) -> Result<(), StoreError> {
        let path = self.path(attachment);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Attachments kept in process memory; URLs use the `memory://` scheme.
#[derive(Debug, Default)]
pub struct MemoryAttachments {
    blobs: DashMap<String, Vec<u8>>,
}

impl MemoryAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl AttachmentStore for MemoryAttachments {
    fn store(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Attachment, StoreError> {
        check_key(key)?;
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(Attachment {
            key: key.to_string(),
            content_type: content_type.to_string(),
            byte_size: bytes.len() as u64,
        })
    }

    fn read(&self, attachment: &Attachment) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .get(&attachment.key)
            .map(|b| b.clone())
            .ok_or_else(|| StoreError::Backend(format!("no attachment `{}`", attachment.key)))
    }

    fn url(&self, attachment: &Attachment) -> String {
        format!("memory://{}", attachment.key)
    }

    fn remove(&self, attachment: &Attachment) -> Result<(), StoreError> {
        self.blobs.remove(&attachment.key);
        Ok(())
    }
}
