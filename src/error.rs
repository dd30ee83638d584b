//! Error types surfaced by sprite sheet resolution.

use std::path::PathBuf;

use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Errors returned from [`SpriteMapBuilder::resolve`](crate::SpriteMapBuilder::resolve).
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot decode image `{}`", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot read image `{}`", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode sprite sheet: {0}")]
    Encode(String),

    #[error("sheet store failed")]
    Persistence(#[source] StoreError),

    #[error("attachment storage failed")]
    Storage(#[source] StoreError),
}

impl SpriteError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Errors from a sheet store or attachment backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record `{}`", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no sheet stored for fingerprint {0}")]
    Missing(Fingerprint),

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of a failed [`SheetStore::insert`](crate::store::SheetStore::insert).
#[derive(Debug, Error)]
pub enum InsertError {
    /// A sheet with the same fingerprint already exists.
    #[error("sheet {0} already exists")]
    Conflict(Fingerprint),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_sprite_error_display() {
        let err = SpriteError::ImageRead {
            path: PathBuf::from("icons/a.png"),
            source: Error::new(ErrorKind::NotFound, "file not found"),
        };
        let display = format!("{err}");
        assert!(display.contains("icons/a.png"));
        assert!(err.source().is_some());

        let err = SpriteError::validation("image map is empty");
        assert_eq!(format!("{err}"), "validation failed: image map is empty");
    }

    #[test]
    fn test_persistence_keeps_source() {
        let err = SpriteError::Persistence(StoreError::io(
            "/tmp/sheets",
            Error::new(ErrorKind::PermissionDenied, "denied"),
        ));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("/tmp/sheets"));
    }
}
