//! Spritemap - fingerprinted horizontal sprite sheets.
//!
//! Given named images, compose them left to right into one sheet, persist
//! the image and a position table, and serve the same sheet on every later
//! request for the same identifier set.
//!
//! ```no_run
//! use spritemap::{FsSpriteMapBuilder, ImageMap, SpriteConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SpriteConfig::discover()?;
//! let builder = FsSpriteMapBuilder::from_config(&config)?;
//!
//! let images = ImageMap::new()
//!     .with("home", "icons/home.png")
//!     .with("search", "icons/search.png");
//! let sheet = builder.resolve(&images)?;
//!
//! let search = sheet.position("search").unwrap();
//! println!("{} @ {}px", builder.url(&sheet), search.x);
//! # Ok(())
//! # }
//! ```

pub mod logger;

pub mod builder;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod image;
pub mod sheet;
pub mod store;
mod utils;

pub use builder::{BuildOptions, FsSpriteMapBuilder, SpriteMapBuilder};
pub use config::SpriteConfig;
pub use error::{InsertError, SpriteError, StoreError};
pub use fingerprint::{Fingerprint, FingerprintMode};
pub use crate::image::{Codec, ImageCodec, OutputFormat};
pub use sheet::{Attachment, ImageMap, Position, Positions, SpriteSheet};
pub use store::{
    AttachmentStore, FsAttachments, FsStore, MemoryAttachments, MemoryStore, SheetStore,
};
