//! Page content filter seam.
//!
//! Content-safety filtering (hidden, tiny, off-page content) belongs to the
//! upstream parser; the hybrid engine only consumes its output through this
//! trait. Implementations must be deterministic: identical inputs yield
//! identical output, because triage decisions are derived from it.

use crate::config::ProcessConfig;
use crate::error::Result;
use crate::model::{ContentObject, InputDocument};

/// Produces the filtered content sequence of one page.
pub trait ContentFilter: Send + Sync {
    /// Filter one page of a document.
    fn filter(
        &self,
        document: &InputDocument,
        page_index: usize,
        config: &ProcessConfig,
    ) -> Result<Vec<ContentObject>>;
}

/// Default filter: passes the parser's raw page content through unchanged.
#[derive(Debug, Clone, Default)]
pub struct PassthroughFilter;

impl ContentFilter for PassthroughFilter {
    fn filter(
        &self,
        document: &InputDocument,
        page_index: usize,
        _config: &ProcessConfig,
    ) -> Result<Vec<ContentObject>> {
        Ok(document.raw_content(page_index).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::model::{BoundingBox, PageInfo};

    #[test]
    fn test_passthrough_returns_raw_content() {
        let document = InputDocument::new("t.pdf", Vec::new(), vec![PageInfo::letter(); 2])
            .with_raw_contents(vec![
                vec![ContentObject::paragraph(BoundingBox::empty(0), "page one")],
                Vec::new(),
            ]);
        let config = ProcessConfig::new(BackendKind::Docling);

        let filter = PassthroughFilter;
        let page0 = filter.filter(&document, 0, &config).unwrap();
        assert_eq!(page0.len(), 1);
        assert_eq!(page0[0].plain_text(), "page one");

        let page1 = filter.filter(&document, 1, &config).unwrap();
        assert!(page1.is_empty());
    }
}
