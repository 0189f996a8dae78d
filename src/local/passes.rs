//! Per-page detection passes.
//!
//! Each pass maps a content sequence to a new content sequence, in reading
//! order, given the run context. The heuristics here are deliberately
//! simple and tunable; the pass order and the shapes they produce are the
//! contract.

use super::RunContext;
use crate::error::Result;
use crate::model::{
    BoundingBox, CellSpec, ContentKind, ContentObject, Heading, List, ListItem, Paragraph,
    TableGrid, TextLine,
};
use crate::transform::sort_reading_order;
use regex::Regex;
use std::sync::OnceLock;

/// Horizontal slack when matching column positions across table rows.
const COLUMN_ALIGN_TOLERANCE: f64 = 12.0;

/// Font-size ratio above the page median that marks a heading.
const HEADING_SIZE_RATIO: f64 = 1.15;

/// Maximum text length for a heading candidate.
const HEADING_MAX_LEN: usize = 120;

/// Maximum vertical gap between a figure and its caption.
const CAPTION_GAP: f64 = 24.0;

fn list_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*((?:\d{1,3}[.)])|(?:[a-z][.)])|[-\u{2022}*\u{25AA}])\s+")
            .expect("list marker pattern is valid")
    })
}

/// Detect borderless tables from column-aligned runs of text lines.
///
/// Two or more consecutive visual rows, each holding the same number of
/// left-aligned cells, are folded into one table grid; everything else
/// passes through.
pub(crate) fn detect_table_borders(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let (mut lines, mut output): (Vec<ContentObject>, Vec<ContentObject>) =
        contents.into_iter().partition(|o| o.is_text_line());

    sort_reading_order(&mut lines);

    // Group lines into visual rows.
    let mut rows: Vec<Vec<ContentObject>> = Vec::new();
    for line in lines {
        match rows.last_mut() {
            Some(row) if row[0].bbox.same_line(&line.bbox) => row.push(line),
            _ => rows.push(vec![line]),
        }
    }

    let mut index = 0;
    while index < rows.len() {
        let run_end = table_run_end(&rows, index);
        if run_end - index >= 2 {
            output.push(build_table(&rows[index..run_end]));
            index = run_end;
        } else {
            output.append(&mut rows[index]);
            index += 1;
        }
    }

    sort_reading_order(&mut output);
    Ok(output)
}

/// End (exclusive) of the aligned multi-cell run starting at `start`.
fn table_run_end(rows: &[Vec<ContentObject>], start: usize) -> usize {
    if rows[start].len() < 2 {
        return start;
    }

    let mut end = start + 1;
    while end < rows.len() && columns_aligned(&rows[start], &rows[end]) {
        end += 1;
    }
    end
}

fn columns_aligned(a: &[ContentObject], b: &[ContentObject]) -> bool {
    if a.len() != b.len() || b.len() < 2 {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x.bbox.left - y.bbox.left).abs() <= COLUMN_ALIGN_TOLERANCE)
}

fn build_table(rows: &[Vec<ContentObject>]) -> ContentObject {
    let col_count = rows[0].len();
    let mut bbox = rows[0][0].bbox;
    let mut specs = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        for (col_index, cell) in row.iter().enumerate() {
            bbox = bbox.union(&cell.bbox);
            specs.push(CellSpec {
                row: row_index,
                col: col_index,
                row_span: 1,
                col_span: 1,
                text: cell.plain_text(),
            });
        }
    }

    let grid = TableGrid::from_cell_specs(bbox, rows.len(), col_count, &specs);
    ContentObject::new(bbox, ContentKind::Table(grid))
}

/// Merge text lines sharing a baseline into single lines.
pub(crate) fn merge_text_lines(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let (mut lines, mut output): (Vec<ContentObject>, Vec<ContentObject>) =
        contents.into_iter().partition(|o| o.is_text_line());

    sort_reading_order(&mut lines);

    let mut merged: Vec<ContentObject> = Vec::new();
    for object in lines {
        let line = match &object.kind {
            ContentKind::TextLine(line) => line.clone(),
            _ => continue,
        };

        match merged.last_mut() {
            Some(last) if last.bbox.same_line(&object.bbox) => {
                if let ContentKind::TextLine(last_line) = &mut last.kind {
                    if !last_line.text.is_empty() && !line.text.is_empty() {
                        last_line.text.push(' ');
                    }
                    last_line.text.push_str(&line.text);
                    last_line.font_size = last_line.font_size.max(line.font_size);
                    last_line.bold |= line.bold;
                }
                last.bbox = last.bbox.union(&object.bbox);
            }
            _ => merged.push(object),
        }
    }

    output.append(&mut merged);
    sort_reading_order(&mut output);
    Ok(output)
}

/// Group vertically adjacent text lines into paragraphs.
///
/// Lines join the open paragraph while the inter-line gap stays within the
/// line's font size, the font size itself is stable, and the left edges
/// roughly agree. Every remaining text line becomes (part of) a paragraph.
pub(crate) fn detect_paragraphs(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let mut output: Vec<ContentObject> = Vec::new();
    let mut open: Option<(BoundingBox, Vec<String>, TextLine)> = None;

    let mut sorted = contents;
    sort_reading_order(&mut sorted);

    for object in sorted {
        let line = match &object.kind {
            ContentKind::TextLine(line) => line.clone(),
            _ => {
                flush_paragraph(&mut output, open.take());
                output.push(object);
                continue;
            }
        };

        match &mut open {
            Some((bbox, texts, first)) if continues_paragraph(bbox, first, &object, &line) => {
                *bbox = bbox.union(&object.bbox);
                texts.push(line.text);
            }
            _ => {
                flush_paragraph(&mut output, open.take());
                open = Some((object.bbox, vec![line.text.clone()], line));
            }
        }
    }
    flush_paragraph(&mut output, open.take());

    sort_reading_order(&mut output);
    Ok(output)
}

fn continues_paragraph(
    bbox: &BoundingBox,
    first: &TextLine,
    next_object: &ContentObject,
    next_line: &TextLine,
) -> bool {
    let gap = bbox.gap_above(&next_object.bbox);
    gap >= -2.0
        && gap <= first.font_size * 1.2
        && (first.font_size - next_line.font_size).abs() <= 1.0
        && (bbox.left - next_object.bbox.left).abs() <= 36.0
}

fn flush_paragraph(
    output: &mut Vec<ContentObject>,
    open: Option<(BoundingBox, Vec<String>, TextLine)>,
) {
    if let Some((bbox, texts, first)) = open {
        output.push(ContentObject::new(
            bbox,
            ContentKind::Paragraph(Paragraph {
                text: texts.join(" "),
                font_size: first.font_size,
            }),
        ));
    }
}

/// Fold marker-led paragraphs into lists.
pub(crate) fn detect_lists(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let mut output: Vec<ContentObject> = Vec::new();
    let mut open: Option<(BoundingBox, Vec<ListItem>, bool)> = None;

    for object in contents {
        let item = match &object.kind {
            ContentKind::Paragraph(paragraph) => parse_list_item(&paragraph.text, object.bbox),
            _ => None,
        };

        match item {
            Some(item) => {
                let ordered = item.marker.starts_with(|c: char| c.is_ascii_digit());
                match &mut open {
                    Some((bbox, items, list_ordered)) if *list_ordered == ordered => {
                        *bbox = bbox.union(&item.bbox);
                        items.push(item);
                    }
                    _ => {
                        flush_list(&mut output, open.take());
                        open = Some((item.bbox, vec![item], ordered));
                    }
                }
            }
            None => {
                flush_list(&mut output, open.take());
                output.push(object);
            }
        }
    }
    flush_list(&mut output, open.take());

    sort_reading_order(&mut output);
    Ok(output)
}

fn parse_list_item(text: &str, bbox: BoundingBox) -> Option<ListItem> {
    let captures = list_marker_regex().captures(text)?;
    let full = captures.get(0)?;
    let marker = captures.get(1)?.as_str().to_string();
    Some(ListItem {
        marker,
        text: text[full.end()..].to_string(),
        bbox,
    })
}

fn flush_list(output: &mut Vec<ContentObject>, open: Option<(BoundingBox, Vec<ListItem>, bool)>) {
    if let Some((bbox, items, ordered)) = open {
        output.push(ContentObject::new(
            bbox,
            ContentKind::List(List { items, ordered }),
        ));
    }
}

/// Promote short, oversized paragraphs to headings.
///
/// Levels assigned here are provisional; the cross-page pass reassigns them
/// from the document-wide font-size ranking.
pub(crate) fn detect_headings(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let mut sizes: Vec<f64> = contents
        .iter()
        .filter_map(|o| match &o.kind {
            ContentKind::Paragraph(p) => Some(p.font_size),
            _ => None,
        })
        .collect();

    if sizes.is_empty() {
        return Ok(contents);
    }
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sizes[sizes.len() / 2];

    let output = contents
        .into_iter()
        .map(|mut object| {
            let promoted = match &object.kind {
                ContentKind::Paragraph(paragraph) => {
                    let text = paragraph.text.trim();
                    if paragraph.font_size >= median * HEADING_SIZE_RATIO
                        && text.len() < HEADING_MAX_LEN
                        && !text.is_empty()
                        && !text.ends_with('.')
                    {
                        Some(Heading {
                            text: text.to_string(),
                            level: 2,
                            font_size: paragraph.font_size,
                        })
                    } else {
                        None
                    }
                }
                _ => None,
            };

            if let Some(heading) = promoted {
                object.kind = ContentKind::Heading(heading);
            }
            object
        })
        .collect();

    Ok(output)
}

/// Assign stable content identifiers to objects that lack one.
///
/// Also used for backend-born objects after transformation, so both paths
/// share one id space per run.
pub fn assign_ids(ctx: &mut RunContext, contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let output = contents
        .into_iter()
        .map(|mut object| {
            if object.id.is_none() {
                object.id = Some(ctx.next_id());
            }
            if let ContentKind::Table(table) = &mut object.kind {
                for cell in &mut table.cells {
                    for nested in &mut cell.content {
                        if nested.id.is_none() {
                            nested.id = Some(ctx.next_id());
                        }
                    }
                }
            }
            object
        })
        .collect();

    Ok(output)
}

/// Attach caption paragraphs to their figures.
pub(crate) fn attach_captions(contents: Vec<ContentObject>) -> Result<Vec<ContentObject>> {
    let caption_indices: Vec<usize> = contents
        .iter()
        .enumerate()
        .filter(|(_, o)| match &o.kind {
            ContentKind::Paragraph(p) => {
                let lower = p.text.trim_start().to_lowercase();
                lower.starts_with("figure") || lower.starts_with("fig.")
            }
            _ => false,
        })
        .map(|(i, _)| i)
        .collect();

    if caption_indices.is_empty() {
        return Ok(contents);
    }

    let mut consumed = vec![false; contents.len()];
    let mut output = contents.clone();

    for (figure_index, object) in contents.iter().enumerate() {
        if !matches!(object.kind, ContentKind::Figure(_)) {
            continue;
        }

        let candidate = caption_indices.iter().copied().find(|&i| {
            !consumed[i]
                && contents[i].bbox.overlaps_horizontally(&object.bbox)
                && is_adjacent_vertically(&object.bbox, &contents[i].bbox)
        });

        if let Some(caption_index) = candidate {
            consumed[caption_index] = true;
            if let ContentKind::Figure(figure) = &mut output[figure_index].kind {
                figure.caption = Some(contents[caption_index].plain_text());
            }
        }
    }

    let result = output
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !consumed[*i])
        .map(|(_, o)| o)
        .collect();
    Ok(result)
}

fn is_adjacent_vertically(figure: &BoundingBox, caption: &BoundingBox) -> bool {
    let below = figure.gap_above(caption);
    let above = caption.gap_above(figure);
    (0.0..=CAPTION_GAP).contains(&below) || (0.0..=CAPTION_GAP).contains(&above)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Figure, InputDocument, PageInfo};

    fn line_at(top: f64, left: f64, text: &str, size: f64) -> ContentObject {
        ContentObject::text_line(
            BoundingBox::new(0, left, top - size, left + text.len() as f64 * size * 0.5, top),
            TextLine::new(text, size),
        )
    }

    #[test]
    fn test_merge_same_baseline() {
        let contents = vec![
            line_at(700.0, 200.0, "World", 11.0),
            line_at(700.0, 72.0, "Hello", 11.0),
        ];
        let merged = merge_text_lines(contents).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].plain_text(), "Hello World");
    }

    #[test]
    fn test_paragraph_break_on_gap() {
        let contents = vec![
            line_at(700.0, 72.0, "para one line one", 11.0),
            line_at(686.0, 72.0, "para one line two", 11.0),
            // Large gap starts a new paragraph.
            line_at(600.0, 72.0, "para two", 11.0),
        ];
        let paragraphs = detect_paragraphs(contents).unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].plain_text().contains("line two"));
    }

    #[test]
    fn test_list_detection() {
        let contents = vec![
            ContentObject::paragraph(BoundingBox::new(0, 72.0, 680.0, 300.0, 692.0), "1. first"),
            ContentObject::paragraph(BoundingBox::new(0, 72.0, 664.0, 300.0, 676.0), "2. second"),
            ContentObject::paragraph(BoundingBox::new(0, 72.0, 600.0, 300.0, 612.0), "not a list"),
        ];
        let output = detect_lists(contents).unwrap();

        assert_eq!(output.len(), 2);
        match &output[0].kind {
            ContentKind::List(list) => {
                assert!(list.ordered);
                assert_eq!(list.items.len(), 2);
                assert_eq!(list.items[0].text, "first");
                assert_eq!(list.items[1].marker, "2.");
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_heading_detection_by_size() {
        let contents = vec![
            ContentObject::new(
                BoundingBox::new(0, 72.0, 700.0, 300.0, 718.0),
                ContentKind::Paragraph(Paragraph {
                    text: "Chapter One".into(),
                    font_size: 18.0,
                }),
            ),
            ContentObject::new(
                BoundingBox::new(0, 72.0, 650.0, 300.0, 662.0),
                ContentKind::Paragraph(Paragraph {
                    text: "Body text that is definitely not a heading.".into(),
                    font_size: 11.0,
                }),
            ),
            ContentObject::new(
                BoundingBox::new(0, 72.0, 630.0, 300.0, 642.0),
                ContentKind::Paragraph(Paragraph {
                    text: "More body text in the usual size.".into(),
                    font_size: 11.0,
                }),
            ),
        ];
        let output = detect_headings(contents).unwrap();
        assert!(output[0].is_heading());
        assert!(!output[1].is_heading());
    }

    #[test]
    fn test_table_from_aligned_columns() {
        let contents = vec![
            line_at(700.0, 72.0, "Name", 11.0),
            line_at(700.0, 300.0, "Age", 11.0),
            line_at(684.0, 72.0, "Alice", 11.0),
            line_at(684.0, 300.0, "30", 11.0),
            line_at(668.0, 72.0, "Bob", 11.0),
            line_at(668.0, 300.0, "25", 11.0),
        ];
        let output = detect_table_borders(contents).unwrap();

        assert_eq!(output.len(), 1);
        match &output[0].kind {
            ContentKind::Table(grid) => {
                assert_eq!(grid.row_count, 3);
                assert_eq!(grid.col_count, 2);
                assert_eq!(grid.cell_at(0, 0).unwrap().plain_text(), "Name");
                assert_eq!(grid.cell_at(2, 1).unwrap().plain_text(), "25");
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_single_column_not_a_table() {
        let contents = vec![
            line_at(700.0, 72.0, "just", 11.0),
            line_at(684.0, 72.0, "prose", 11.0),
        ];
        let output = detect_table_borders(contents).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|o| o.is_text_line()));
    }

    #[test]
    fn test_assign_ids_nested() {
        let doc = InputDocument::new("t.pdf", Vec::new(), vec![PageInfo::letter()]);
        let mut ctx = RunContext::new(&doc);

        let bbox = BoundingBox::new(0, 0.0, 0.0, 100.0, 100.0);
        let grid = TableGrid::from_cell_specs(
            bbox,
            1,
            1,
            &[CellSpec {
                row: 0,
                col: 0,
                row_span: 1,
                col_span: 1,
                text: "cell".into(),
            }],
        );
        let contents = vec![ContentObject::new(bbox, ContentKind::Table(grid))];

        let output = assign_ids(&mut ctx, contents).unwrap();
        assert!(output[0].id.is_some());
        match &output[0].kind {
            ContentKind::Table(grid) => {
                assert!(grid.cells[0].content[0].id.is_some());
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_caption_attached_to_figure() {
        let figure = ContentObject::new(
            BoundingBox::new(0, 72.0, 500.0, 300.0, 700.0),
            ContentKind::Figure(Figure {
                image_index: 1,
                caption: None,
            }),
        );
        let caption = ContentObject::paragraph(
            BoundingBox::new(0, 72.0, 480.0, 300.0, 492.0),
            "Figure 1: a chart",
        );

        let output = attach_captions(vec![figure, caption]).unwrap();
        assert_eq!(output.len(), 1);
        match &output[0].kind {
            ContentKind::Figure(f) => {
                assert_eq!(f.caption.as_deref(), Some("Figure 1: a chart"));
            }
            other => panic!("expected figure, got {:?}", other),
        }
    }
}
