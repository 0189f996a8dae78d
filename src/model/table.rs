//! Table grid types.

use super::{BoundingBox, ContentObject};
use serde::{Deserialize, Serialize};

/// A table reconstructed as a rows × columns grid of cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableGrid {
    /// Number of grid rows
    pub row_count: usize,

    /// Number of grid columns
    pub col_count: usize,

    /// Cells in row-major order, one per grid position
    pub cells: Vec<TableCell>,
}

impl TableGrid {
    /// Create an empty grid with the given shape.
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
            cells: Vec::with_capacity(row_count * col_count),
        }
    }

    /// Reconstruct a grid from a flat, possibly sparse cell list.
    ///
    /// Every grid position receives a cell: positions with a declared spec
    /// take its spans and text, positions without one get an empty 1x1
    /// cell. Cell boxes are derived by dividing the table box proportionally
    /// by row/column index and span, so span-adjusted boxes tile the table
    /// box exactly along both axes.
    pub fn from_cell_specs(
        bbox: BoundingBox,
        row_count: usize,
        col_count: usize,
        specs: &[CellSpec],
    ) -> Self {
        let mut grid = Self::new(row_count, col_count);
        if row_count == 0 || col_count == 0 {
            return grid;
        }

        let row_height = bbox.height() / row_count as f64;
        let col_width = bbox.width() / col_count as f64;

        for row in 0..row_count {
            for col in 0..col_count {
                let spec = specs.iter().find(|s| s.row == row && s.col == col);
                let (row_span, col_span, text) = match spec {
                    Some(s) => (s.row_span.max(1), s.col_span.max(1), s.text.as_str()),
                    None => (1, 1, ""),
                };

                let left = bbox.left + col as f64 * col_width;
                let right = left + col_span as f64 * col_width;
                let top = bbox.top - row as f64 * row_height;
                let bottom = top - row_span as f64 * row_height;
                let cell_bbox = BoundingBox::new(bbox.page, left, bottom, right, top);

                let content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ContentObject::paragraph(cell_bbox, text)]
                };

                grid.cells.push(TableCell {
                    row,
                    col,
                    row_span,
                    col_span,
                    bbox: cell_bbox,
                    content,
                });
            }
        }

        grid
    }

    /// Get the cell at a grid position.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Check if the grid holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if any cell spans multiple rows or columns.
    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().any(|c| c.row_span > 1 || c.col_span > 1)
    }

    /// Tab/newline-separated text of all cells, row by row.
    pub fn plain_text(&self) -> String {
        (0..self.row_count)
            .map(|row| {
                self.cells
                    .iter()
                    .filter(|c| c.row == row)
                    .map(|c| c.plain_text())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    /// Grid row of the cell's top-left corner
    pub row: usize,

    /// Grid column of the cell's top-left corner
    pub col: usize,

    /// Number of rows this cell spans
    pub row_span: usize,

    /// Number of columns this cell spans
    pub col_span: usize,

    /// Span-adjusted cell bounding box
    pub bbox: BoundingBox,

    /// Nested content (typically one paragraph with the cell text)
    pub content: Vec<ContentObject>,
}

impl TableCell {
    /// Plain text of the cell's nested content.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|o| o.plain_text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if this cell spans multiple rows or columns.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}

/// A declared cell from a backend's flat cell list.
#[derive(Debug, Clone)]
pub struct CellSpec {
    /// Grid row index
    pub row: usize,
    /// Grid column index
    pub col: usize,
    /// Declared row span (values below 1 are treated as 1)
    pub row_span: usize,
    /// Declared column span (values below 1 are treated as 1)
    pub col_span: usize,
    /// Cell text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_bbox() -> BoundingBox {
        BoundingBox::new(0, 100.0, 500.0, 300.0, 600.0)
    }

    #[test]
    fn test_grid_shape_preserved_with_span() {
        let specs = vec![
            CellSpec {
                row: 0,
                col: 0,
                row_span: 1,
                col_span: 2,
                text: "Header".into(),
            },
            CellSpec {
                row: 1,
                col: 0,
                row_span: 1,
                col_span: 1,
                text: "A".into(),
            },
            CellSpec {
                row: 1,
                col: 1,
                row_span: 1,
                col_span: 1,
                text: "B".into(),
            },
        ];
        let grid = TableGrid::from_cell_specs(table_bbox(), 2, 2, &specs);

        assert_eq!(grid.row_count, 2);
        assert_eq!(grid.col_count, 2);

        let spanning = grid.cell_at(0, 0).unwrap();
        assert_eq!(spanning.col_span, 2);
        // Spanning cell covers both column widths: 2 * 100.0
        assert_eq!(spanning.bbox.width(), 200.0);
    }

    #[test]
    fn test_missing_cells_filled_empty() {
        let specs = vec![CellSpec {
            row: 0,
            col: 0,
            row_span: 1,
            col_span: 1,
            text: "only".into(),
        }];
        let grid = TableGrid::from_cell_specs(table_bbox(), 2, 2, &specs);

        assert_eq!(grid.cells.len(), 4);
        let empty = grid.cell_at(1, 1).unwrap();
        assert!(empty.content.is_empty());
        assert_eq!(empty.row_span, 1);
    }

    #[test]
    fn test_cells_tile_table_box() {
        let bbox = table_bbox();
        let grid = TableGrid::from_cell_specs(bbox, 2, 2, &[]);

        // Corner cells meet the table box edges exactly.
        let tl = grid.cell_at(0, 0).unwrap();
        let br = grid.cell_at(1, 1).unwrap();
        assert_eq!(tl.bbox.left, bbox.left);
        assert_eq!(tl.bbox.top, bbox.top);
        assert_eq!(br.bbox.right, bbox.right);
        assert_eq!(br.bbox.bottom, bbox.bottom);

        // Adjacent cells share edges along both axes.
        let tr = grid.cell_at(0, 1).unwrap();
        assert_eq!(tl.bbox.right, tr.bbox.left);
        let bl = grid.cell_at(1, 0).unwrap();
        assert_eq!(tl.bbox.bottom, bl.bbox.top);
    }

    #[test]
    fn test_plain_text_rows() {
        let specs = vec![
            CellSpec {
                row: 0,
                col: 0,
                row_span: 1,
                col_span: 1,
                text: "Name".into(),
            },
            CellSpec {
                row: 0,
                col: 1,
                row_span: 1,
                col_span: 1,
                text: "Age".into(),
            },
        ];
        let grid = TableGrid::from_cell_specs(table_bbox(), 1, 2, &specs);
        assert_eq!(grid.plain_text(), "Name\tAge");
        assert!(!grid.has_merged_cells());
    }
}
