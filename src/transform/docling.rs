//! docling schema transformer.
//!
//! Converts a docling document tree into the common content model.
//!
//! # Schema mapping
//!
//! | docling element / label                  | Content object        |
//! |------------------------------------------|-----------------------|
//! | `texts` label `title`                    | Heading, level 1      |
//! | `texts` label `section_header`           | Heading, level 2      |
//! | `texts` label `page_header`/`page_footer`/`page_number` | dropped (furniture) |
//! | `texts` label `list_item`                | single-item List      |
//! | `texts` label `formula`                  | Formula               |
//! | `texts` label `text`/`caption`/`footnote`/other | Paragraph       |
//! | `tables`                                 | Table grid            |
//! | `pictures`                               | Figure                |
//!
//! # Coordinates
//!
//! docling provenance boxes are `{l, t, r, b}` in points, tagged with a
//! `coord_origin` of `TOPLEFT` (flipped here using the page height) or
//! `BOTTOMLEFT` (passed through).

use super::{sort_reading_order, SchemaTransformer};
use crate::backend::HybridResponse;
use crate::config::BackendKind;
use crate::error::Result;
use crate::model::{
    BoundingBox, CellSpec, ContentKind, ContentObject, Figure, Formula, List, ListItem, TableGrid,
};
use serde_json::Value;
use std::collections::BTreeMap;

const LABEL_TITLE: &str = "title";
const LABEL_SECTION_HEADER: &str = "section_header";
const LABEL_PAGE_HEADER: &str = "page_header";
const LABEL_PAGE_FOOTER: &str = "page_footer";
const LABEL_PAGE_NUMBER: &str = "page_number";
const LABEL_LIST_ITEM: &str = "list_item";
const LABEL_FORMULA: &str = "formula";

/// Transformer for docling document trees.
#[derive(Debug, Clone, Default)]
pub struct DoclingTransformer;

impl DoclingTransformer {
    /// Create a transformer.
    pub fn new() -> Self {
        Self
    }

    /// The document tree: some servers wrap it in a `document` envelope.
    fn document_root(json: &Value) -> &Value {
        json.get("document").unwrap_or(json)
    }

    /// Page heights in points embedded in the tree, keyed by 1-based page
    /// number.
    fn embedded_heights(root: &Value) -> BTreeMap<u32, f64> {
        let mut heights = BTreeMap::new();

        if let Some(pages) = root.get("pages").and_then(Value::as_object) {
            for (key, page) in pages {
                if let (Ok(number), Some(height)) = (
                    key.parse::<u32>(),
                    page.pointer("/size/height").and_then(Value::as_f64),
                ) {
                    heights.insert(number, height);
                }
            }
        }

        heights
    }

    fn max_prov_page(root: &Value) -> u32 {
        let mut max = 0;
        for key in ["texts", "tables", "pictures"] {
            if let Some(elements) = root.get(key).and_then(Value::as_array) {
                for element in elements {
                    max = max.max(Self::page_number_of(element));
                }
            }
        }
        max
    }

    /// 1-based page number from an element's first provenance entry.
    fn page_number_of(element: &Value) -> u32 {
        element
            .pointer("/prov/0/page_no")
            .and_then(Value::as_u64)
            .unwrap_or(1) as u32
    }

    /// Bounding box from an element's first provenance entry.
    fn bbox_of(element: &Value, page_index: usize, page_height: f64) -> BoundingBox {
        let bbox = match element.pointer("/prov/0/bbox") {
            Some(bbox) => bbox,
            None => return BoundingBox::empty(page_index),
        };

        let left = bbox.get("l").and_then(Value::as_f64).unwrap_or(0.0);
        let top = bbox.get("t").and_then(Value::as_f64).unwrap_or(0.0);
        let right = bbox.get("r").and_then(Value::as_f64).unwrap_or(0.0);
        let bottom = bbox.get("b").and_then(Value::as_f64).unwrap_or(0.0);

        let origin = bbox
            .get("coord_origin")
            .and_then(Value::as_str)
            .unwrap_or("TOPLEFT");

        if origin.eq_ignore_ascii_case("BOTTOMLEFT") {
            BoundingBox::new(page_index, left, bottom, right, top)
        } else {
            BoundingBox::new(page_index, left, page_height - bottom, right, page_height - top)
        }
    }

    fn transform_text(
        element: &Value,
        result: &mut Vec<Vec<ContentObject>>,
        heights: &BTreeMap<u32, f64>,
    ) {
        let label = element.get("label").and_then(Value::as_str).unwrap_or("");
        if matches!(label, LABEL_PAGE_HEADER | LABEL_PAGE_FOOTER | LABEL_PAGE_NUMBER) {
            return;
        }

        let page_number = Self::page_number_of(element);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = heights.get(&page_number).copied().unwrap_or(792.0);
        let bbox = Self::bbox_of(element, page_index, page_height);
        let text = element.get("text").and_then(Value::as_str).unwrap_or("");

        let object = match label {
            LABEL_TITLE => ContentObject::heading(bbox, text, 1),
            LABEL_SECTION_HEADER => ContentObject::heading(bbox, text, 2),
            LABEL_FORMULA => ContentObject::new(
                bbox,
                ContentKind::Formula(Formula {
                    source: text.to_string(),
                }),
            ),
            LABEL_LIST_ITEM => {
                let marker = element
                    .get("marker")
                    .and_then(Value::as_str)
                    .unwrap_or("-")
                    .to_string();
                let ordered = element
                    .get("enumerated")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                ContentObject::new(
                    bbox,
                    ContentKind::List(List {
                        items: vec![ListItem {
                            marker,
                            text: text.to_string(),
                            bbox,
                        }],
                        ordered,
                    }),
                )
            }
            _ => ContentObject::paragraph(bbox, text),
        };

        result[page_index].push(object);
    }

    fn transform_table(
        element: &Value,
        result: &mut Vec<Vec<ContentObject>>,
        heights: &BTreeMap<u32, f64>,
    ) {
        let row_count = element
            .pointer("/data/num_rows")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let col_count = element
            .pointer("/data/num_cols")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        if row_count == 0 || col_count == 0 {
            return;
        }

        let page_number = Self::page_number_of(element);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = heights.get(&page_number).copied().unwrap_or(792.0);
        let bbox = Self::bbox_of(element, page_index, page_height);

        let specs: Vec<CellSpec> = element
            .pointer("/data/table_cells")
            .and_then(Value::as_array)
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| CellSpec {
                        row: cell
                            .get("start_row_offset_idx")
                            .and_then(Value::as_u64)
                            .unwrap_or(0) as usize,
                        col: cell
                            .get("start_col_offset_idx")
                            .and_then(Value::as_u64)
                            .unwrap_or(0) as usize,
                        row_span: cell.get("row_span").and_then(Value::as_u64).unwrap_or(1)
                            as usize,
                        col_span: cell.get("col_span").and_then(Value::as_u64).unwrap_or(1)
                            as usize,
                        text: cell
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let grid = TableGrid::from_cell_specs(bbox, row_count, col_count, &specs);
        result[page_index].push(ContentObject::new(bbox, ContentKind::Table(grid)));
    }

    fn transform_picture(
        element: &Value,
        image_index: &mut u32,
        result: &mut Vec<Vec<ContentObject>>,
        heights: &BTreeMap<u32, f64>,
    ) {
        let page_number = Self::page_number_of(element);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = heights.get(&page_number).copied().unwrap_or(792.0);
        let bbox = Self::bbox_of(element, page_index, page_height);

        *image_index += 1;
        result[page_index].push(ContentObject::new(
            bbox,
            ContentKind::Figure(Figure {
                image_index: *image_index,
                caption: None,
            }),
        ));
    }
}

impl SchemaTransformer for DoclingTransformer {
    fn backend(&self) -> BackendKind {
        BackendKind::Docling
    }

    fn transform(
        &self,
        response: &HybridResponse,
        page_heights: &BTreeMap<u32, f64>,
    ) -> Result<Vec<Vec<ContentObject>>> {
        let root = Self::document_root(response.json());
        if root.is_null() {
            log::warn!("docling response JSON is null, returning empty result");
            return Ok(Vec::new());
        }

        // Caller-supplied heights win over geometry embedded in the tree.
        let mut heights = Self::embedded_heights(root);
        for (page, height) in page_heights {
            heights.insert(*page, *height);
        }

        let page_count = page_heights
            .keys()
            .max()
            .copied()
            .or_else(|| heights.keys().max().copied())
            .unwrap_or_else(|| Self::max_prov_page(root))
            .max(1) as usize;

        let mut result: Vec<Vec<ContentObject>> = vec![Vec::new(); page_count];
        let mut image_index: u32 = 0;

        if let Some(texts) = root.get("texts").and_then(Value::as_array) {
            for element in texts {
                Self::transform_text(element, &mut result, &heights);
            }
        }

        if let Some(tables) = root.get("tables").and_then(Value::as_array) {
            for element in tables {
                Self::transform_table(element, &mut result, &heights);
            }
        }

        if let Some(pictures) = root.get("pictures").and_then(Value::as_array) {
            for element in pictures {
                Self::transform_picture(element, &mut image_index, &mut result, &heights);
            }
        }

        for page in &mut result {
            sort_reading_order(page);
        }

        Ok(result)
    }
}

fn ensure_page(result: &mut Vec<Vec<ContentObject>>, page_index: usize) {
    while result.len() <= page_index {
        result.push(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn letter_heights() -> BTreeMap<u32, f64> {
        let mut heights = BTreeMap::new();
        heights.insert(1, 792.0);
        heights
    }

    fn text_element(label: &str, text: &str, t: f64, b: f64) -> Value {
        json!({
            "label": label,
            "text": text,
            "prov": [{
                "page_no": 1,
                "bbox": {"l": 72.0, "t": t, "r": 300.0, "b": b, "coord_origin": "TOPLEFT"}
            }]
        })
    }

    #[test]
    fn test_label_mapping_and_flip() {
        let json = json!({
            "texts": [
                text_element("title", "The Title", 50.0, 80.0),
                text_element("section_header", "Part One", 120.0, 140.0),
                text_element("text", "Body.", 160.0, 180.0),
                text_element("page_footer", "page 1 of 9", 760.0, 780.0),
            ]
        });

        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &letter_heights())
            .unwrap();

        // Furniture dropped, rest in reading order.
        assert_eq!(result[0].len(), 3);
        assert_eq!(result[0][0].plain_text(), "The Title");

        // TOPLEFT t=50 flips to top = 792 - 50.
        assert_eq!(result[0][0].bbox.top, 742.0);
        assert_eq!(result[0][0].bbox.bottom, 712.0);
    }

    #[test]
    fn test_bottomleft_origin_passthrough() {
        let json = json!({
            "texts": [{
                "label": "text",
                "text": "already flipped",
                "prov": [{
                    "page_no": 1,
                    "bbox": {"l": 10.0, "t": 700.0, "r": 90.0, "b": 680.0, "coord_origin": "BOTTOMLEFT"}
                }]
            }]
        });

        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &letter_heights())
            .unwrap();

        assert_eq!(result[0][0].bbox.top, 700.0);
        assert_eq!(result[0][0].bbox.bottom, 680.0);
    }

    #[test]
    fn test_list_item_and_formula() {
        let json = json!({
            "texts": [
                {
                    "label": "list_item",
                    "text": "first point",
                    "marker": "1.",
                    "enumerated": true,
                    "prov": [{"page_no": 1, "bbox": {"l": 72.0, "t": 200.0, "r": 300.0, "b": 214.0, "coord_origin": "TOPLEFT"}}]
                },
                text_element("formula", "a^2 + b^2 = c^2", 240.0, 260.0),
            ]
        });

        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &letter_heights())
            .unwrap();

        match &result[0][0].kind {
            ContentKind::List(list) => {
                assert!(list.ordered);
                assert_eq!(list.items[0].marker, "1.");
                assert_eq!(list.items[0].text, "first point");
            }
            other => panic!("expected list, got {:?}", other),
        }
        match &result[0][1].kind {
            ContentKind::Formula(f) => assert_eq!(f.source, "a^2 + b^2 = c^2"),
            other => panic!("expected formula, got {:?}", other),
        }
    }

    #[test]
    fn test_table_from_flat_cells() {
        let json = json!({
            "tables": [{
                "prov": [{"page_no": 1, "bbox": {"l": 72.0, "t": 100.0, "r": 272.0, "b": 300.0, "coord_origin": "TOPLEFT"}}],
                "data": {
                    "num_rows": 2,
                    "num_cols": 2,
                    "table_cells": [
                        {"start_row_offset_idx": 0, "start_col_offset_idx": 0, "col_span": 2, "text": "Header"},
                        {"start_row_offset_idx": 1, "start_col_offset_idx": 1, "text": "B"}
                    ]
                }
            }]
        });

        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &letter_heights())
            .unwrap();

        let grid = match &result[0][0].kind {
            ContentKind::Table(grid) => grid,
            other => panic!("expected table, got {:?}", other),
        };
        assert_eq!(grid.row_count, 2);
        assert_eq!(grid.cell_at(0, 0).unwrap().col_span, 2);
        // Missing (1,0) filled with an empty cell.
        assert!(grid.cell_at(1, 0).unwrap().content.is_empty());
    }

    #[test]
    fn test_document_envelope_and_embedded_heights() {
        let json = json!({
            "document": {
                "pages": {"1": {"size": {"width": 612.0, "height": 612.0}}},
                "texts": [text_element("text", "hello", 12.0, 24.0)]
            }
        });

        // No caller-supplied heights: the embedded page size drives the flip.
        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &BTreeMap::new())
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0][0].bbox.top, 600.0);
    }

    #[test]
    fn test_pictures_numbered_per_call() {
        let picture = json!({
            "prov": [{"page_no": 1, "bbox": {"l": 0.0, "t": 0.0, "r": 100.0, "b": 100.0, "coord_origin": "TOPLEFT"}}]
        });
        let json = json!({"pictures": [picture.clone(), picture]});

        let transformer = DoclingTransformer::new();
        let result = transformer
            .transform(&HybridResponse::new(json), &letter_heights())
            .unwrap();

        let indices: Vec<u32> = result[0]
            .iter()
            .filter_map(|o| match &o.kind {
                ContentKind::Figure(f) => Some(f.image_index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
