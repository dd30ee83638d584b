//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! fingerprint = "identifiers"   # identifiers | content
//! lock = true                   # serialize concurrent builds of one sheet
//! max_canvas_bytes = 536870912  # largest RGBA canvas a build may allocate
//! ```
//!
//! With `fingerprint = "identifiers"` a sheet is keyed by its identifier set
//! alone: replacing an image file under the same identifier keeps serving
//! the old sheet. `content` also hashes every source file, at the cost of
//! reading all sources on each request.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::fingerprint::FingerprintMode;
use crate::image::DEFAULT_MAX_CANVAS_BYTES;

/// Sheet build behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// What the sheet fingerprint covers.
    pub fingerprint: FingerprintMode,

    /// Hold a per-fingerprint lock while building, so concurrent requests
    /// for the same sheet decode and composite only once.
    pub lock: bool,

    /// Upper bound on `width * height * 4` of the composed canvas.
    pub max_canvas_bytes: u64,
}

impl BuildConfig {
    pub const MAX_CANVAS_BYTES: FieldPath = FieldPath::new("build.max_canvas_bytes");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_canvas_bytes == 0 {
            diag.error_with_hint(
                Self::MAX_CANVAS_BYTES,
                "must be greater than 0",
                format!("remove it to use the default of {DEFAULT_MAX_CANVAS_BYTES}"),
            );
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            fingerprint: FingerprintMode::Identifiers,
            lock: true,
            max_canvas_bytes: DEFAULT_MAX_CANVAS_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use crate::fingerprint::FingerprintMode;
    use crate::image::DEFAULT_MAX_CANVAS_BYTES;

    #[test]
    fn test_build_config() {
        let config = test_parse_config(
            "[build]\nfingerprint = \"content\"\nlock = false\nmax_canvas_bytes = 4096",
        );
        assert_eq!(config.build.fingerprint, FingerprintMode::Content);
        assert!(!config.build.lock);
        assert_eq!(config.build.max_canvas_bytes, 4096);
    }

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.fingerprint, FingerprintMode::Identifiers);
        assert!(config.build.lock);
        assert_eq!(config.build.max_canvas_bytes, DEFAULT_MAX_CANVAS_BYTES);
    }

    #[test]
    fn test_build_config_rejects_zero_canvas_limit() {
        let config = test_parse_config("[build]\nmax_canvas_bytes = 0");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(config.validate().is_err());
    }
}
