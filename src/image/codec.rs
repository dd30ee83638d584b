//! Source decoding and sheet encoding.

use std::io::Cursor;
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::{ExtendedColorType, ImageFormat, ImageReader, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::SpriteError;
use crate::utils::mime;

/// Encoded sheet format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, keeps transparency.
    #[default]
    Png,
    /// Drops the alpha channel.
    Jpeg,
    /// Lossless WebP, keeps transparency.
    Webp,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => mime::types::PNG,
            Self::Jpeg => mime::types::JPEG,
            Self::Webp => mime::types::WEBP,
        }
    }

    pub const fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

/// Decodes source images and encodes finished sheets.
pub trait Codec: Send + Sync {
    /// Read and decode the image at `path`.
    fn decode(&self, path: &Path) -> Result<RgbaImage, SpriteError>;

    /// Encode a composed canvas.
    fn encode(&self, canvas: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, SpriteError>;
}

/// [`Codec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn decode(&self, path: &Path) -> Result<RgbaImage, SpriteError> {
        let read_err = |source| SpriteError::ImageRead {
            path: path.to_path_buf(),
            source,
        };

        let reader = ImageReader::open(path)
            .map_err(read_err)?
            .with_guessed_format()
            .map_err(read_err)?;

        let img = reader.decode().map_err(|source| SpriteError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(img.to_rgba8())
    }

    fn encode(&self, canvas: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, SpriteError> {
        let (width, height) = canvas.dimensions();
        let mut bytes = Vec::new();
        let mut out = Cursor::new(&mut bytes);

        // Encode straight from the canvas buffer; only JPEG needs a copy
        let written = if format.supports_alpha() {
            image::write_buffer_with_format(
                &mut out,
                canvas.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
                format.image_format(),
            )
        } else {
            let rgb: RgbImage = canvas.convert();
            image::write_buffer_with_format(
                &mut out,
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
                format.image_format(),
            )
        };
        written.map_err(|e| SpriteError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}
