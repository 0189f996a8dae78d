//! Schema transformers.
//!
//! Each remote backend speaks its own wire schema and coordinate
//! convention. A [`SchemaTransformer`] converts one backend's native result
//! into the common content model: points, bottom-left origin, one object
//! sequence per page, sorted into reading order.

mod azure;
mod docling;

pub use azure::AzureTransformer;
pub use docling::DoclingTransformer;

use crate::backend::HybridResponse;
use crate::config::BackendKind;
use crate::error::Result;
use crate::model::{ContentObject, SAME_LINE_TOLERANCE};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Converts a backend-native result into per-page content sequences.
///
/// `page_heights` maps 1-based page numbers to heights in points for the
/// pages the caller knows about; transformers fall back to geometry
/// embedded in the response, then to US Letter. Implementations hold no
/// state across calls and must not be shared across concurrent
/// transformations of different documents.
pub trait SchemaTransformer: Send + Sync {
    /// The backend whose schema this transformer understands.
    fn backend(&self) -> BackendKind;

    /// Transform a response into per-page content, outer index = 0-based
    /// page index.
    fn transform(
        &self,
        response: &HybridResponse,
        page_heights: &BTreeMap<u32, f64>,
    ) -> Result<Vec<Vec<ContentObject>>>;
}

/// Create the transformer matching a backend.
pub fn transformer_for(backend: BackendKind) -> Box<dyn SchemaTransformer> {
    match backend {
        BackendKind::Azure => Box::new(AzureTransformer::new()),
        BackendKind::Docling => Box::new(DoclingTransformer::new()),
    }
}

/// Sort a page's objects into reading order.
///
/// Primary order is top-to-bottom; objects whose top edges lie within the
/// same-line tolerance order left-to-right instead.
pub fn sort_reading_order(objects: &mut [ContentObject]) {
    objects.sort_by(|a, b| {
        if (a.bbox.top - b.bbox.top).abs() > SAME_LINE_TOLERANCE {
            b.bbox
                .top
                .partial_cmp(&a.bbox.top)
                .unwrap_or(Ordering::Equal)
        } else {
            a.bbox
                .left
                .partial_cmp(&b.bbox.left)
                .unwrap_or(Ordering::Equal)
        }
    });
}

/// Extrema of a flat `[x1,y1,x2,y2,...]` polygon.
///
/// Returns `None` for polygons with fewer than four points.
pub(crate) fn polygon_extrema(polygon: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if polygon.len() < 8 {
        return None;
    }

    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;

    for pair in polygon.chunks_exact(2) {
        min_x = min_x.min(pair[0]);
        max_x = max_x.max(pair[0]);
        min_y = min_y.min(pair[1]);
        max_y = max_y.max(pair[1]);
    }

    Some((min_x, min_y, max_x, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn paragraph_at(top: f64, left: f64, text: &str) -> ContentObject {
        ContentObject::paragraph(BoundingBox::new(0, left, top - 12.0, left + 100.0, top), text)
    }

    #[test]
    fn test_reading_order_top_to_bottom() {
        // Top-left-origin y = 1.0, 4.0, 8.0 inches on a letter page become
        // descending tops in the bottom-left space.
        let mut objects = vec![
            paragraph_at(792.0 - 4.0 * 72.0, 72.0, "Second"),
            paragraph_at(792.0 - 8.0 * 72.0, 72.0, "Third"),
            paragraph_at(792.0 - 1.0 * 72.0, 72.0, "First"),
        ];
        sort_reading_order(&mut objects);

        let texts: Vec<String> = objects.iter().map(|o| o.plain_text()).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_reading_order_same_line_left_to_right() {
        let mut objects = vec![
            paragraph_at(700.0, 300.0, "right"),
            paragraph_at(702.0, 72.0, "left"),
        ];
        sort_reading_order(&mut objects);

        let texts: Vec<String> = objects.iter().map(|o| o.plain_text()).collect();
        assert_eq!(texts, vec!["left", "right"]);
    }

    #[test]
    fn test_polygon_extrema() {
        let polygon = [1.0, 1.0, 3.0, 1.0, 3.0, 1.5, 1.0, 1.5];
        let (min_x, min_y, max_x, max_y) = polygon_extrema(&polygon).unwrap();
        assert_eq!((min_x, min_y, max_x, max_y), (1.0, 1.0, 3.0, 1.5));

        assert!(polygon_extrema(&[1.0, 2.0]).is_none());
    }
}
