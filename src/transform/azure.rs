//! Azure Document Intelligence schema transformer.
//!
//! Converts an `analyzeResult` tree (prebuilt-layout model) into the common
//! content model.
//!
//! # Schema mapping
//!
//! | Azure element                                | Content object        |
//! |----------------------------------------------|-----------------------|
//! | `paragraphs` role `title`                    | Heading, level 1      |
//! | `paragraphs` role `sectionHeading`           | Heading, level 2      |
//! | `paragraphs` role `pageHeader`/`pageFooter`/`pageNumber` | dropped (furniture) |
//! | `paragraphs` role `footnote`, null, other    | Paragraph             |
//! | `tables`                                     | Table grid            |
//! | `figures`                                    | Figure                |
//! | `pages[].formulas`                           | Formula               |
//!
//! # Coordinates
//!
//! Azure reports polygons `[x1,y1,...,x4,y4]` in inches from a top-left
//! origin. Every box is converted to points (x72) and flipped to the
//! bottom-left origin using the page height.

use super::{polygon_extrema, sort_reading_order, SchemaTransformer};
use crate::backend::HybridResponse;
use crate::config::BackendKind;
use crate::error::Result;
use crate::model::{
    BoundingBox, CellSpec, ContentKind, ContentObject, Figure, Formula, TableGrid,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Conversion factor from inches to points.
const INCHES_TO_POINTS: f64 = 72.0;

const ROLE_SECTION_HEADING: &str = "sectionHeading";
const ROLE_TITLE: &str = "title";
const ROLE_PAGE_HEADER: &str = "pageHeader";
const ROLE_PAGE_FOOTER: &str = "pageFooter";
const ROLE_PAGE_NUMBER: &str = "pageNumber";

/// Transformer for Azure Document Intelligence results.
#[derive(Debug, Clone, Default)]
pub struct AzureTransformer;

impl AzureTransformer {
    /// Create a transformer.
    pub fn new() -> Self {
        Self
    }

    /// Page dimensions `(width, height)` in inches, keyed by 1-based page
    /// number.
    fn page_dimensions(json: &Value) -> BTreeMap<u32, (f64, f64)> {
        let mut dimensions = BTreeMap::new();

        if let Some(pages) = json.get("pages").and_then(Value::as_array) {
            for page in pages {
                let number = page.get("pageNumber").and_then(Value::as_u64).unwrap_or(0) as u32;
                if number > 0 {
                    let width = page.get("width").and_then(Value::as_f64).unwrap_or(8.5);
                    let height = page.get("height").and_then(Value::as_f64).unwrap_or(11.0);
                    dimensions.insert(number, (width, height));
                }
            }
        }

        dimensions
    }

    fn page_count(
        json: &Value,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) -> usize {
        if let Some(max) = page_heights.keys().max() {
            return *max as usize;
        }
        if let Some(max) = dimensions.keys().max() {
            return *max as usize;
        }
        json.get("pages")
            .and_then(Value::as_array)
            .map(|pages| pages.len())
            .unwrap_or(1)
            .max(1)
    }

    /// Page height in points: caller-supplied heights win, then response
    /// geometry, then US Letter.
    fn page_height_points(
        page_number: u32,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) -> f64 {
        if let Some(height) = page_heights.get(&page_number) {
            return *height;
        }
        if let Some((_, height)) = dimensions.get(&page_number) {
            return height * INCHES_TO_POINTS;
        }
        11.0 * INCHES_TO_POINTS
    }

    /// 1-based page number from an element's `boundingRegions`.
    fn page_number_of(node: &Value) -> u32 {
        node.get("boundingRegions")
            .and_then(Value::as_array)
            .and_then(|regions| regions.first())
            .and_then(|region| region.get("pageNumber"))
            .and_then(Value::as_u64)
            .unwrap_or(1) as u32
    }

    /// Bounding box from an element's `boundingRegions` polygon.
    fn bbox_of(node: &Value, page_index: usize, page_height: f64) -> BoundingBox {
        node.get("boundingRegions")
            .and_then(Value::as_array)
            .and_then(|regions| regions.first())
            .and_then(|region| region.get("polygon"))
            .and_then(|polygon| Self::polygon_to_bbox(polygon, page_index, page_height))
            .unwrap_or_else(|| BoundingBox::empty(page_index))
    }

    /// Bounding box from an element carrying a `polygon` directly.
    fn direct_bbox_of(node: &Value, page_index: usize, page_height: f64) -> BoundingBox {
        node.get("polygon")
            .and_then(|polygon| Self::polygon_to_bbox(polygon, page_index, page_height))
            .unwrap_or_else(|| BoundingBox::empty(page_index))
    }

    /// Convert an inch-valued top-left-origin polygon to a point-valued
    /// bottom-left-origin box.
    fn polygon_to_bbox(polygon: &Value, page_index: usize, page_height: f64) -> Option<BoundingBox> {
        let coords: Vec<f64> = polygon
            .as_array()?
            .iter()
            .filter_map(Value::as_f64)
            .map(|v| v * INCHES_TO_POINTS)
            .collect();

        let (min_x, min_y, max_x, max_y) = polygon_extrema(&coords)?;
        Some(BoundingBox::new(
            page_index,
            min_x,
            page_height - max_y,
            max_x,
            page_height - min_y,
        ))
    }

    fn transform_paragraph(
        paragraph: &Value,
        result: &mut Vec<Vec<ContentObject>>,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) {
        let role = paragraph.get("role").and_then(Value::as_str);

        // Furniture never reaches the content model.
        if matches!(
            role,
            Some(ROLE_PAGE_HEADER) | Some(ROLE_PAGE_FOOTER) | Some(ROLE_PAGE_NUMBER)
        ) {
            return;
        }

        let page_number = Self::page_number_of(paragraph);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = Self::page_height_points(page_number, page_heights, dimensions);
        let bbox = Self::bbox_of(paragraph, page_index, page_height);
        let text = paragraph
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("");

        let object = match role {
            Some(ROLE_TITLE) => ContentObject::heading(bbox, text, 1),
            Some(ROLE_SECTION_HEADING) => ContentObject::heading(bbox, text, 2),
            _ => ContentObject::paragraph(bbox, text),
        };

        result[page_index].push(object);
    }

    fn transform_table(
        table: &Value,
        result: &mut Vec<Vec<ContentObject>>,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) {
        let row_count = table.get("rowCount").and_then(Value::as_u64).unwrap_or(0) as usize;
        let col_count = table
            .get("columnCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        if row_count == 0 || col_count == 0 {
            return;
        }

        let page_number = Self::page_number_of(table);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = Self::page_height_points(page_number, page_heights, dimensions);
        let bbox = Self::bbox_of(table, page_index, page_height);

        let specs: Vec<CellSpec> = table
            .get("cells")
            .and_then(Value::as_array)
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| CellSpec {
                        row: cell.get("rowIndex").and_then(Value::as_u64).unwrap_or(0) as usize,
                        col: cell.get("columnIndex").and_then(Value::as_u64).unwrap_or(0) as usize,
                        row_span: cell.get("rowSpan").and_then(Value::as_u64).unwrap_or(1) as usize,
                        col_span: cell.get("columnSpan").and_then(Value::as_u64).unwrap_or(1)
                            as usize,
                        text: cell
                            .get("content")
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

    fn transform_figure(
        figure: &Value,
        image_index: &mut u32,
        result: &mut Vec<Vec<ContentObject>>,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) {
        let page_number = Self::page_number_of(figure);
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = Self::page_height_points(page_number, page_heights, dimensions);
        let bbox = Self::bbox_of(figure, page_index, page_height);

        *image_index += 1;
        result[page_index].push(ContentObject::new(
            bbox,
            ContentKind::Figure(Figure {
                image_index: *image_index,
                caption: None,
            }),
        ));
    }

    fn transform_formula(
        formula: &Value,
        page_number: u32,
        result: &mut Vec<Vec<ContentObject>>,
        page_heights: &BTreeMap<u32, f64>,
        dimensions: &BTreeMap<u32, (f64, f64)>,
    ) {
        let page_index = page_number as usize - 1;
        ensure_page(result, page_index);

        let page_height = Self::page_height_points(page_number, page_heights, dimensions);
        let bbox = Self::direct_bbox_of(formula, page_index, page_height);
        let source = formula.get("value").and_then(Value::as_str).unwrap_or("");

        result[page_index].push(ContentObject::new(
            bbox,
            ContentKind::Formula(Formula {
                source: source.to_string(),
            }),
        ));
    }
}

impl SchemaTransformer for AzureTransformer {
    fn backend(&self) -> BackendKind {
        BackendKind::Azure
    }

    fn transform(
        &self,
        response: &HybridResponse,
        page_heights: &BTreeMap<u32, f64>,
    ) -> Result<Vec<Vec<ContentObject>>> {
        let json = response.json();
        if json.is_null() {
            log::warn!("azure response JSON is null, returning empty result");
            return Ok(Vec::new());
        }

        let dimensions = Self::page_dimensions(json);
        let page_count = Self::page_count(json, page_heights, &dimensions);
        let mut result: Vec<Vec<ContentObject>> = vec![Vec::new(); page_count];

        // The figure index is an explicit cursor scoped to this call, so
        // concurrent transforms of different documents cannot interleave.
        let mut image_index: u32 = 0;

        if let Some(paragraphs) = json.get("paragraphs").and_then(Value::as_array) {
            for paragraph in paragraphs {
                Self::transform_paragraph(paragraph, &mut result, page_heights, &dimensions);
            }
        }

        if let Some(tables) = json.get("tables").and_then(Value::as_array) {
            for table in tables {
                Self::transform_table(table, &mut result, page_heights, &dimensions);
            }
        }

        if let Some(figures) = json.get("figures").and_then(Value::as_array) {
            for figure in figures {
                Self::transform_figure(
                    figure,
                    &mut image_index,
                    &mut result,
                    page_heights,
                    &dimensions,
                );
            }
        }

        if let Some(pages) = json.get("pages").and_then(Value::as_array) {
            for page in pages {
                let page_number =
                    page.get("pageNumber").and_then(Value::as_u64).unwrap_or(1) as u32;
                if let Some(formulas) = page.get("formulas").and_then(Value::as_array) {
                    for formula in formulas {
                        Self::transform_formula(
                            formula,
                            page_number,
                            &mut result,
                            page_heights,
                            &dimensions,
                        );
                    }
                }
            }
        }

        for page in &mut result {
            sort_reading_order(page);
        }

        Ok(result)
    }
}

/// Grow the result so `page_index` is addressable.
fn ensure_page(result: &mut Vec<Vec<ContentObject>>, page_index: usize) {
    while result.len() <= page_index {
        result.push(Vec::new());
    }
}
