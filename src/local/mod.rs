//! Local structural processing.
//!
//! The local path turns a page's filtered content into semantic objects by
//! applying detection passes in a fixed order, then (after merge) a set of
//! cross-page passes over the whole document. Every pass is a function of
//! the content sequence and an explicit [`RunContext`]; there is no hidden
//! per-run global state, but the context is not shareable across pages, so
//! the per-page pipeline runs sequentially.

mod crosspage;
mod passes;

pub use crosspage::apply_cross_page_passes;
pub use passes::assign_ids;

use crate::error::Result;
use crate::model::{ContentObject, InputDocument};
use std::collections::BTreeMap;

/// Explicit state for one document run.
///
/// Carries the content-id counter and page geometry the passes need. Scoped
/// to a single run; never shared across documents.
#[derive(Debug)]
pub struct RunContext {
    next_content_id: u64,
    page_heights: Vec<f64>,
}

impl RunContext {
    /// Create a context for one document.
    pub fn new(document: &InputDocument) -> Self {
        Self {
            next_content_id: 1,
            page_heights: document.pages.iter().map(|p| p.height).collect(),
        }
    }

    /// Allocate the next stable content identifier.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_content_id;
        self.next_content_id += 1;
        id
    }

    /// Height of a page in points (US Letter if unknown).
    pub fn page_height(&self, page_index: usize) -> f64 {
        self.page_heights.get(page_index).copied().unwrap_or(792.0)
    }

    /// Number of pages in the run.
    pub fn page_count(&self) -> usize {
        self.page_heights.len()
    }
}

/// Run the per-page pipeline over a set of pages.
///
/// Pages are processed one at a time. A failure on one page leaves that
/// page's filtered content unmodified and processing continues; the
/// failure is logged, never propagated.
pub fn process_pages(
    ctx: &mut RunContext,
    filtered_by_page: &BTreeMap<usize, Vec<ContentObject>>,
    pages: &[usize],
) -> BTreeMap<usize, Vec<ContentObject>> {
    let mut results = BTreeMap::new();

    for &page in pages {
        let filtered = filtered_by_page.get(&page).cloned().unwrap_or_default();
        let contents = match process_page(ctx, filtered.clone()) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("error processing page {}: {}", page, err);
                filtered
            }
        };
        results.insert(page, contents);
    }

    results
}

/// The fixed per-page pass order.
fn process_page(
    ctx: &mut RunContext,
    contents: Vec<ContentObject>,
) -> Result<Vec<ContentObject>> {
    let contents = passes::detect_table_borders(contents)?;
    let contents = passes::merge_text_lines(contents)?;
    let contents = passes::detect_paragraphs(contents)?;
    let contents = passes::detect_lists(contents)?;
    let contents = passes::detect_headings(contents)?;
    let contents = passes::assign_ids(ctx, contents)?;
    passes::attach_captions(contents)
}
