//! MIME type detection for stored sheet images.

/// Image MIME type constants.
pub mod types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WEBP: &str = "image/webp";
}

/// Check if the MIME type represents an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Sniff the MIME type of encoded image bytes.
///
/// Returns `None` when the bytes do not start with a known image signature.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image() {
        assert!(is_image(types::PNG));
        assert!(is_image("image/svg+xml"));
        assert!(!is_image("text/plain"));
    }

    #[test]
    fn test_sniff_image() {
        let png_magic = b"\x89PNG\r\n\x1a\n\0\0\0\0";
        assert_eq!(sniff_image(png_magic), Some(types::PNG));
        assert_eq!(sniff_image(b"hello world"), None);
    }
}
