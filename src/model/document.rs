//! Input document types.
//!
//! The orchestrator does not open PDFs itself; the upstream parser hands it
//! an [`InputDocument`] carrying the raw bytes (forwarded verbatim to remote
//! backends), per-page geometry, and the raw per-page content it extracted.

use super::ContentObject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Geometry of a single page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page width in points
    pub width: f64,

    /// Page height in points
    pub height: f64,
}

impl PageInfo {
    /// Create page geometry from a width and height in points.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter geometry (612 x 792 points).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// A4 geometry (595 x 842 points).
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }
}

/// A document handed to the hybrid engine by the upstream parser.
#[derive(Debug, Clone)]
pub struct InputDocument {
    /// Document name, used in logs and the triage log file
    pub name: String,

    /// Raw PDF bytes, forwarded to remote backends
    pub bytes: Vec<u8>,

    /// Per-page geometry, indexed by 0-based page index
    pub pages: Vec<PageInfo>,

    /// Raw (unfiltered) content per page, as extracted upstream
    raw_contents: Vec<Vec<ContentObject>>,
}

impl InputDocument {
    /// Create a document with no raw content.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, pages: Vec<PageInfo>) -> Self {
        let raw_contents = vec![Vec::new(); pages.len()];
        Self {
            name: name.into(),
            bytes,
            pages,
            raw_contents,
        }
    }

    /// Attach raw per-page content. The outer vector is truncated or padded
    /// with empty pages to match the page count.
    pub fn with_raw_contents(mut self, mut contents: Vec<Vec<ContentObject>>) -> Self {
        contents.resize(self.pages.len(), Vec::new());
        self.raw_contents = contents;
        self
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Raw content of a page.
    pub fn raw_content(&self, page_index: usize) -> &[ContentObject] {
        self.raw_contents
            .get(page_index)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Page height in points, if the page exists.
    pub fn page_height(&self, page_index: usize) -> Option<f64> {
        self.pages.get(page_index).map(|p| p.height)
    }

    /// Page heights keyed by 1-based page number, for the given pages.
    ///
    /// Schema transformers consume 1-based page numbers because that is what
    /// every backend wire schema uses.
    pub fn page_heights_by_number(&self, pages: &[usize]) -> BTreeMap<u32, f64> {
        pages
            .iter()
            .filter_map(|&i| self.page_height(i).map(|h| (i as u32 + 1, h)))
            .collect()
    }
}

/// Which pages of a document to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Process every page
    #[default]
    All,

    /// Process an inclusive range of 0-based page indices
    Range(RangeInclusive<usize>),

    /// Process an explicit set of 0-based page indices
    Pages(Vec<usize>),
}

impl PageSelection {
    /// Check if a page index is in scope.
    pub fn contains(&self, page_index: usize) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page_index),
            PageSelection::Pages(pages) => pages.contains(&page_index),
        }
    }

    /// The in-scope page indices of a document with `page_count` pages.
    pub fn in_scope(&self, page_count: usize) -> Vec<usize> {
        (0..page_count).filter(|&i| self.contains(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pages: usize) -> InputDocument {
        InputDocument::new(
            "test.pdf",
            b"%PDF-1.7".to_vec(),
            vec![PageInfo::letter(); pages],
        )
    }

    #[test]
    fn test_page_heights_by_number() {
        let doc = doc(3);
        let heights = doc.page_heights_by_number(&[0, 2]);
        assert_eq!(heights.len(), 2);
        assert_eq!(heights[&1], 792.0);
        assert_eq!(heights[&3], 792.0);
        assert!(!heights.contains_key(&2));
    }

    #[test]
    fn test_raw_contents_padded() {
        let doc = doc(3).with_raw_contents(vec![vec![ContentObject::paragraph(
            crate::model::BoundingBox::empty(0),
            "x",
        )]]);
        assert_eq!(doc.raw_content(0).len(), 1);
        assert!(doc.raw_content(1).is_empty());
        assert!(doc.raw_content(2).is_empty());
        assert!(doc.raw_content(9).is_empty());
    }

    #[test]
    fn test_page_selection() {
        let all = PageSelection::All;
        assert!(all.contains(0));
        assert!(all.contains(99));

        let range = PageSelection::Range(1..=3);
        assert!(!range.contains(0));
        assert!(range.contains(3));
        assert_eq!(range.in_scope(6), vec![1, 2, 3]);

        let pages = PageSelection::Pages(vec![0, 4]);
        assert_eq!(pages.in_scope(3), vec![0]);
    }
}
