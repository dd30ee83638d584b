//! `[store]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [store]
//! root = ".spritemap"   # records in root/sheets, images in root/images
//! ```
//!
//! Relative roots resolve against the config file's directory; `~` expands
//! to the home directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Where sheet records and images are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl StoreConfig {
    pub const ROOT: FieldPath = FieldPath::new("store.root");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.root.as_os_str().is_empty() {
            diag.error(Self::ROOT, "must not be empty");
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".spritemap"),
        }
    }
}
