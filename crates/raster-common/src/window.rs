//! Rectangular pixel windows inside a parent grid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangular block of pixels, offset from the parent grid's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col_off: u32,
    pub row_off: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    pub fn new(col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window covering a whole `width` x `height` grid.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels in the window.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn col_end(&self) -> u32 {
        self.col_off + self.width
    }

    /// Exclusive bottom edge.
    pub fn row_end(&self) -> u32 {
        self.row_off + self.height
    }

    /// Check if this window shares at least one pixel with another.
    pub fn intersects(&self, other: &PixelWindow) -> bool {
        self.col_off < other.col_end()
            && self.col_end() > other.col_off
            && self.row_off < other.row_end()
            && self.row_end() > other.row_off
    }

    /// Check if `other` lies completely inside this window.
    pub fn contains(&self, other: &PixelWindow) -> bool {
        other.col_off >= self.col_off
            && other.row_off >= self.row_off
            && other.col_end() <= self.col_end()
            && other.row_end() <= self.row_end()
    }

    /// Check if a pixel lies inside the window.
    pub fn contains_pixel(&self, col: u32, row: u32) -> bool {
        col >= self.col_off && col < self.col_end() && row >= self.row_off && row < self.row_end()
    }
}

impl fmt::Display for PixelWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.col_off, self.row_off
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_windows_do_not_intersect() {
        let left = PixelWindow::new(0, 0, 10, 10);
        let right = PixelWindow::new(10, 0, 10, 10);
        let below = PixelWindow::new(0, 10, 10, 10);

        assert!(!left.intersects(&right));
        assert!(!left.intersects(&below));
        assert!(left.intersects(&PixelWindow::new(9, 9, 5, 5)));
    }

    #[test]
    fn test_contains() {
        let full = PixelWindow::full(100, 50);
        assert!(full.contains(&PixelWindow::new(90, 40, 10, 10)));
        assert!(!full.contains(&PixelWindow::new(91, 40, 10, 10)));
        assert!(full.contains_pixel(99, 49));
        assert!(!full.contains_pixel(100, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(PixelWindow::new(1032, 0, 1032, 1032).to_string(), "1032x1032+1032+0");
    }
}
