//! Sprite sheet resolution: fingerprint, look up, or build and persist.
//!
//! ```text
//! ImageMap ─► validate ─► fingerprint ─► store.touch ─┬─ hit ──────────────► SpriteSheet
//!                                                     └─ miss ─► lock ─► re-check
//!                                                                  └─► decode ─► layout
//!                                                                      ─► size check
//!                                                                      ─► compose ─► encode
//!                                                                      ─► attach ─► insert
//! ```
//!
//! The store's uniqueness on fingerprint is the only correctness guarantee
//! for concurrent callers: a build that loses the insert race discards its
//! own image and returns the winner's record. The per-fingerprint lock only
//! saves duplicate decode/composite work inside one builder.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use image::RgbaImage;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::config::SpriteConfig;
use crate::error::{InsertError, SpriteError, StoreError};
use crate::fingerprint::{self, Fingerprint, FingerprintMode};
use crate::image::{Codec, DEFAULT_MAX_CANVAS_BYTES, ImageCodec, Layout, OutputFormat, compose};
use crate::sheet::{Attachment, ImageMap, SpriteSheet, current_timestamp};
use crate::store::{AttachmentStore, FsAttachments, FsStore, SheetStore, attempt_id};
use crate::utils::mime;
use crate::{debug, log};

/// Knobs for [`SpriteMapBuilder`].
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub format: OutputFormat,
    pub fingerprint: FingerprintMode,
    /// Serialize builds of the same fingerprint within this builder.
    pub lock: bool,
    /// Largest canvas, in RGBA bytes, a build may allocate.
    pub max_canvas_bytes: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            fingerprint: FingerprintMode::Identifiers,
            lock: true,
            max_canvas_bytes: DEFAULT_MAX_CANVAS_BYTES,
        }
    }
}

impl From<&SpriteConfig> for BuildOptions {
    fn from(config: &SpriteConfig) -> Self {
        Self {
            format: config.output.format,
            fingerprint: config.build.fingerprint,
            lock: config.build.lock,
            max_canvas_bytes: config.build.max_canvas_bytes,
        }
    }
}

/// Builds sprite sheets on first request and serves them by fingerprint after.
pub struct SpriteMapBuilder<S, A, C = ImageCodec> {
    store: S,
    attachments: A,
    codec: C,
    options: BuildOptions,
    locks: DashMap<Fingerprint, Arc<Mutex<()>>>,
}

/// Builder persisting records and images on the local filesystem.
pub type FsSpriteMapBuilder = SpriteMapBuilder<FsStore, FsAttachments, ImageCodec>;

impl FsSpriteMapBuilder {
    /// Open the stores named by `config` (`{store.root}/sheets`, `{store.root}/images`).
    pub fn from_config(config: &SpriteConfig) -> Result<Self, SpriteError> {
        let store = FsStore::open(&config.store.root).map_err(SpriteError::Persistence)?;
        let attachments = FsAttachments::open(&config.store.root, &config.output.url_prefix)
            .map_err(SpriteError::Storage)?;

        Ok(Self::new(store, attachments, ImageCodec).with_options(BuildOptions::from(config)))
    }
}

impl<S, A, C> SpriteMapBuilder<S, A, C>
where
    S: SheetStore,
    A: AttachmentStore,
    C: Codec,
{
    pub fn new(store: S, attachments: A, codec: C) -> Self {
        Self {
            store,
            attachments,
            codec,
            options: BuildOptions::default(),
            locks: DashMap::new(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn attachments(&self) -> &A {
        &self.attachments
    }

    /// Fingerprint `images` would be stored under.
    pub fn fingerprint(&self, images: &ImageMap) -> Result<Fingerprint, SpriteError> {
        fingerprint::compute(images, self.options.fingerprint).map_err(|(path, source)| {
            SpriteError::ImageRead {
                path: path.into(),
                source,
            }
        })
    }

    /// Return the sheet for `images`, building and persisting it on first use.
    ///
    /// A cache hit only bumps the record's `updated_at`; no image is read
    /// (in [`FingerprintMode::Identifiers`]).
    pub fn resolve(&self, images: &ImageMap) -> Result<SpriteSheet, SpriteError> {
        images.validate()?;
        let fingerprint = self.fingerprint(images)?;

        if let Some(sheet) = self.cached(&fingerprint)? {
            return Ok(sheet);
        }

        if !self.options.lock {
            return self.build(images, fingerprint);
        }

        let lock = self.locks.entry(fingerprint).or_default().clone();
        let result = {
            let _guard = lock.lock();
            match self.cached(&fingerprint) {
                Ok(Some(sheet)) => Ok(sheet),
                Ok(None) => self.build(images, fingerprint),
                Err(e) => Err(e),
            }
        };
        // Map entry + our clone: nobody else is waiting
        self.locks.remove_if(&fingerprint, |_, l| {
            Arc::ptr_eq(l, &lock) && Arc::strong_count(l) <= 2
        });

        result
    }

    /// Retrievable URL of a sheet's image.
    pub fn url(&self, sheet: &SpriteSheet) -> String {
        self.attachments.url(&sheet.image)
    }

    /// Encoded bytes of a sheet's image.
    pub fn image_bytes(&self, sheet: &SpriteSheet) -> Result<Vec<u8>, SpriteError> {
        self.attachments
            .read(&sheet.image)
            .map_err(SpriteError::Storage)
    }

    fn cached(&self, fingerprint: &Fingerprint) -> Result<Option<SpriteSheet>, SpriteError> {
        let sheet = self
            .store
            .touch(fingerprint)
            .map_err(SpriteError::Persistence)?;
        if sheet.is_some() {
            debug!("sprite"; "hit {}", fingerprint);
        }
        Ok(sheet)
    }

    fn build(&self, images: &ImageMap, fingerprint: Fingerprint) -> Result<SpriteSheet, SpriteError> {
        let started = Instant::now();
        let format = self.options.format;
        let entries: Vec<(&str, &Path)> = images.iter().collect();

        // Nothing is persisted until every source decoded
        let decoded: Vec<RgbaImage> = entries
            .par_iter()
            .map(|(_, path)| self.codec.decode(path))
            .collect::<Result<_, _>>()?;

        let layout = Layout::horizontal(
            entries
                .iter()
                .zip(&decoded)
                .map(|((id, _), img)| (*id, img.dimensions())),
        )?;
        layout.check_canvas(self.options.max_canvas_bytes)?;
        let canvas = compose(&layout, &decoded);
        drop(decoded);

        if !format.supports_alpha() && canvas.pixels().any(|p| p[3] < u8::MAX) {
            log!("warning"; "sheet {} encoded as {}, transparency dropped", fingerprint, format.extension());
        }

        let bytes = self.codec.encode(&canvas, format)?;
        let content_type = check_content_type(&bytes, format)?;

        let key = format!(
            "{}-{}.{}",
            fingerprint.to_hex(),
            attempt_id(),
            format.extension()
        );
        let image = self
            .attachments
            .store(&key, &bytes, content_type)
            .map_err(SpriteError::Storage)?;

        let now = current_timestamp();
        let (width, height) = (layout.width(), layout.height());
        let sheet = SpriteSheet {
            fingerprint,
            positions: layout.into_positions(),
            image,
            width,
            height,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = sheet.validate() {
            self.discard(&sheet.image);
            return Err(e);
        }

        match self.store.insert(&sheet) {
            Ok(()) => {
                debug!(
                    "sprite";
                    "built {} ({}x{}, {} images) in {:?}",
                    fingerprint, width, height, sheet.positions.len(), started.elapsed()
                );
                Ok(sheet)
            }
            Err(InsertError::Conflict(_)) => {
                self.discard(&sheet.image);
                debug!("sprite"; "lost race for {}, using stored sheet", fingerprint);
                self.store
                    .find(&fingerprint)
                    .map_err(SpriteError::Persistence)?
                    .ok_or(SpriteError::Persistence(StoreError::Missing(fingerprint)))
            }
            Err(InsertError::Store(e)) => {
                self.discard(&sheet.image);
                Err(SpriteError::Persistence(e))
            }
        }
    }

    /// Remove an image no record points to.
    fn discard(&self, attachment: &Attachment) {
        if let Err(e) = self.attachments.remove(attachment) {
            log!("warning"; "cannot remove orphaned image {}: {}", attachment.key, e);
        }
    }
}

/// Encoded bytes must sniff as the format they were encoded in.
fn check_content_type(bytes: &[u8], format: OutputFormat) -> Result<&'static str, SpriteError> {
    let expected = format.content_type();
    match mime::sniff_image(bytes) {
        Some(found) if found == expected && mime::is_image(found) => Ok(found),
        Some(found) => Err(SpriteError::validation(format!(
            "encoded image is {found}, expected {expected}"
        ))),
        None => Err(SpriteError::validation(format!(
            "encoded bytes are not an image, expected {expected}"
        ))),
    }
}
