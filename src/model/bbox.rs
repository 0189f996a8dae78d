//! Bounding-box geometry.
//!
//! All coordinates in the content model are PDF points (1 point = 1/72 inch)
//! in a bottom-left-origin space. Every object born from a remote backend
//! must already be converted into this space by its schema transformer.

use serde::{Deserialize, Serialize};

/// Vertical distance (in points) below which two objects are considered to
/// sit on the same line for reading-order purposes.
pub const SAME_LINE_TOLERANCE: f64 = 5.0;

/// A page-relative bounding box with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 0-based page index
    pub page: usize,

    /// Left edge in points
    pub left: f64,

    /// Bottom edge in points
    pub bottom: f64,

    /// Right edge in points
    pub right: f64,

    /// Top edge in points
    pub top: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(page: usize, left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            page,
            left,
            bottom,
            right,
            top,
        }
    }

    /// An empty box at the page origin.
    pub fn empty(page: usize) -> Self {
        Self::new(page, 0.0, 0.0, 0.0, 0.0)
    }

    /// Box width in points.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Box height in points.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Check if the box has zero area.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest box covering both `self` and `other`.
    ///
    /// The page index of `self` wins; callers only union boxes on one page.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            page: self.page,
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Check if two boxes overlap horizontally.
    pub fn overlaps_horizontally(&self, other: &BoundingBox) -> bool {
        self.left < other.right && other.left < self.right
    }

    /// Check if two boxes sit on the same line within the reading-order
    /// tolerance.
    pub fn same_line(&self, other: &BoundingBox) -> bool {
        (self.top - other.top).abs() <= SAME_LINE_TOLERANCE
    }

    /// Vertical gap between this box and one below it (negative if they
    /// overlap).
    pub fn gap_above(&self, below: &BoundingBox) -> f64 {
        self.bottom - below.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let bbox = BoundingBox::new(0, 72.0, 684.0, 216.0, 720.0);
        assert_eq!(bbox.width(), 144.0);
        assert_eq!(bbox.height(), 36.0);
        assert!(!bbox.is_degenerate());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0, 10.0, 10.0, 20.0, 20.0);
        let b = BoundingBox::new(0, 15.0, 5.0, 30.0, 18.0);
        let u = a.union(&b);
        assert_eq!(u.left, 10.0);
        assert_eq!(u.bottom, 5.0);
        assert_eq!(u.right, 30.0);
        assert_eq!(u.top, 20.0);
    }

    #[test]
    fn test_same_line_tolerance() {
        let a = BoundingBox::new(0, 0.0, 100.0, 50.0, 112.0);
        let b = BoundingBox::new(0, 60.0, 100.0, 110.0, 115.0);
        let c = BoundingBox::new(0, 0.0, 50.0, 50.0, 62.0);
        assert!(a.same_line(&b));
        assert!(!a.same_line(&c));
    }

    #[test]
    fn test_horizontal_overlap() {
        let a = BoundingBox::new(0, 0.0, 0.0, 50.0, 10.0);
        let b = BoundingBox::new(0, 40.0, 20.0, 90.0, 30.0);
        let c = BoundingBox::new(0, 60.0, 0.0, 90.0, 10.0);
        assert!(a.overlaps_horizontally(&b));
        assert!(!a.overlaps_horizontally(&c));
    }
}
