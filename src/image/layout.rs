//! Horizontal strip layout.
//!
//! Images are placed left to right in input order, all on `y = 0`. The
//! canvas is as wide as all images together and as tall as the tallest.

use crate::error::SpriteError;
use crate::sheet::{Position, Positions};

/// Default canvas budget, the same 512 MiB the `image` crate allows a
/// single decode to allocate.
pub const DEFAULT_MAX_CANVAS_BYTES: u64 = 512 * 1024 * 1024;

const BYTES_PER_PIXEL: u64 = 4;

/// Computed placements and canvas size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    positions: Vec<Position>,
    width: u32,
    height: u32,
}

impl Layout {
    /// Lay out `(identifier, (width, height))` pairs in iteration order.
    pub fn horizontal<'a>(
        items: impl IntoIterator<Item = (&'a str, (u32, u32))>,
    ) -> Result<Self, SpriteError> {
        let mut positions = Vec::new();
        let mut total_width = 0u32;
        let mut total_height = 0u32;

        for (identifier, (width, height)) in items {
            if width == 0 || height == 0 {
                return Err(SpriteError::validation(format!(
                    "`{identifier}` has an empty size ({width}x{height})"
                )));
            }

            positions.push(Position {
                identifier: identifier.to_string(),
                x: total_width,
                y: 0,
                width,
                height,
            });

            total_width = total_width.checked_add(width).ok_or_else(|| {
                SpriteError::validation(format!(
                    "sheet width overflows at `{identifier}` ({total_width} + {width})"
                ))
            })?;
            total_height = total_height.max(height);
        }

        Ok(Self {
            positions,
            width: total_width,
            height: total_height,
        })
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the RGBA canvas this layout needs.
    pub fn canvas_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL
    }

    /// Reject layouts whose canvas would exceed `max_bytes`. Call before
    /// allocating the canvas.
    pub fn check_canvas(&self, max_bytes: u64) -> Result<(), SpriteError> {
        let needed = self.canvas_bytes();
        if needed > max_bytes {
            return Err(SpriteError::validation(format!(
                "sheet canvas {}x{} needs {needed} bytes, limit is {max_bytes}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn into_positions(self) -> Positions {
        Positions::new(self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(positions: &[Position]) {
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                let overlap = u64::from(a.x) < b.right() && u64::from(b.x) < a.right();
                assert!(!overlap, "{} overlaps {}", a.identifier, b.identifier);
            }
        }
    }

    #[test]
    fn test_three_images() {
        let layout =
            Layout::horizontal([("a", (10, 5)), ("b", (20, 8)), ("c", (5, 5))]).unwrap();

        let xs: Vec<_> = layout.positions().iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xs, [(0, 0), (10, 0), (30, 0)]);

        let b = &layout.positions()[1];
        assert_eq!((b.width, b.height), (20, 8));
        assert_eq!(layout.width(), 35);
        assert_eq!(layout.height(), 8);
    }

    #[test]
    fn test_order_follows_input() {
        let layout = Layout::horizontal([("c", (5, 5)), ("a", (10, 5))]).unwrap();
        assert_eq!(layout.positions()[0].identifier, "c");
        assert_eq!(layout.positions()[1].x, 5);
    }

    #[test]
    fn test_placements_never_overlap() {
        let sizes = [(1, 1), (7, 3), (64, 2), (3, 90), (12, 12), (1, 40)];
        let items: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("img{i}"), *s))
            .collect();
        let layout = Layout::horizontal(items.iter().map(|(id, s)| (id.as_str(), *s))).unwrap();

        assert_disjoint(layout.positions());
        assert_eq!(layout.width(), sizes.iter().map(|s| s.0).sum::<u32>());
        assert_eq!(layout.height(), 90);
    }

    #[test]
    fn test_empty_layout() {
        let layout = Layout::horizontal(std::iter::empty()).unwrap();
        assert_eq!((layout.width(), layout.height()), (0, 0));
        assert!(layout.into_positions().is_empty());
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        let err = Layout::horizontal([("a", (0, 5))]).unwrap_err();
        assert!(matches!(err, SpriteError::Validation(_)));
    }

    #[test]
    fn test_width_overflow_rejected() {
        let err = Layout::horizontal([("a", (u32::MAX, 1)), ("b", (1, 1))]).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_canvas_over_limit_rejected() {
        // One wide and one tall image: tiny sources, ~19.6 GB canvas
        let layout = Layout::horizontal([("w", (70_000, 1)), ("t", (1, 70_000))]).unwrap();
        assert_eq!((layout.width(), layout.height()), (70_001, 70_000));
        assert_eq!(layout.canvas_bytes(), 19_600_280_000);

        let err = layout.check_canvas(DEFAULT_MAX_CANVAS_BYTES).unwrap_err();
        assert!(matches!(err, SpriteError::Validation(_)));
        assert!(err.to_string().contains("19600280000"));
    }

    #[test]
    fn test_canvas_at_limit_accepted() {
        let layout = Layout::horizontal([("a", (10, 5)), ("b", (20, 8))]).unwrap();
        assert_eq!(layout.canvas_bytes(), 30 * 8 * 4);
        assert!(layout.check_canvas(30 * 8 * 4).is_ok());
        assert!(layout.check_canvas(30 * 8 * 4 - 1).is_err());
    }
}
