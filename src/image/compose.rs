//! Canvas allocation and compositing.

use image::{Rgba, RgbaImage, imageops};

use super::layout::Layout;

/// Fully transparent canvas.
pub fn canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
}

/// Draw `image` onto `canvas` at `(x, y)` with source-over blending.
pub fn composite(canvas: &mut RgbaImage, image: &RgbaImage, x: u32, y: u32) {
    imageops::overlay(canvas, image, i64::from(x), i64::from(y));
}

/// Compose decoded images onto one canvas following `layout`.
///
/// `images` must be in layout order.
pub fn compose(layout: &Layout, images: &[RgbaImage]) -> RgbaImage {
    debug_assert_eq!(layout.positions().len(), images.len());

    let mut sheet = canvas(layout.width(), layout.height());
    for (position, image) in layout.positions().iter().zip(images) {
        composite(&mut sheet, image, position.x, position.y);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_is_transparent() {
        let c = canvas(3, 2);
        assert_eq!(c.dimensions(), (3, 2));
        assert!(c.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_compose_places_pixels() {
        let red = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(1, 3, Rgba([0, 0, 255, 255]));
        let layout = Layout::horizontal([("red", (2, 1)), ("blue", (1, 3))]).unwrap();

        let sheet = compose(&layout, &[red, blue]);
        assert_eq!(sheet.dimensions(), (3, 3));
        assert_eq!(*sheet.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*sheet.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*sheet.get_pixel(2, 2), Rgba([0, 0, 255, 255]));
        // Below the shorter image stays transparent
        assert_eq!(sheet.get_pixel(0, 1)[3], 0);
    }

    #[test]
    fn test_composite_keeps_transparent_source_pixels() {
        let mut c = canvas(1, 1);
        let clear = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 0]));
        composite(&mut c, &clear, 0, 0);
        assert_eq!(c.get_pixel(0, 0)[3], 0);
    }
}
