//! `[log]` section configuration.
//!
//! ```toml
//! [log]
//! verbose = false   # print cache hits, store writes and build timings
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub verbose: bool,
}
