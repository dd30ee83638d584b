//! Configuration section definitions.

mod build;
mod log;
mod output;
mod store;

pub use build::BuildConfig;
pub use log::LogConfig;
pub use output::OutputConfig;
pub use store::StoreConfig;
