//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `expand_path`)

pub mod fs;

pub use fs::{expand_path, normalize_path};
