//! Image layout, compositing and codecs.
//!
//! # Modules
//!
//! - [`layout`]: Left-to-right placement of source images
//! - [`compose`]: Transparent canvas + source-over compositing
//! - [`codec`]: Decoding sources and encoding the finished sheet

pub mod codec;
pub mod compose;
pub mod layout;

pub use codec::{Codec, ImageCodec, OutputFormat};
pub use compose::{canvas, compose, composite};
pub use layout::{DEFAULT_MAX_CANVAS_BYTES, Layout};
