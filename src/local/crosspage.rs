//! Cross-page passes.
//!
//! These run once on the complete merged document, after both processing
//! paths have produced their pages: header/footer removal, list
//! continuation stitching, neighbor-table merging, document-wide heading
//! levels, and structural outline levels. Running them before merge would
//! let per-path artifacts (a header only "recurring" on local pages, a list
//! split across a path boundary) slip through.

use super::{passes, RunContext};
use crate::model::{ContentKind, ContentObject};
use std::collections::HashMap;

/// Fraction of the page height treated as the header / footer zone.
const EDGE_ZONE_RATIO: f64 = 0.1;

/// Minimum number of pages a recurring edge text must appear on.
const MIN_RECURRENCE: usize = 2;

/// Apply every cross-page pass, in order, to the merged document.
pub fn apply_cross_page_passes(ctx: &mut RunContext, contents: &mut Vec<Vec<ContentObject>>) {
    remove_headers_and_footers(ctx, contents);

    // Re-detect lists now that headers no longer interrupt item runs.
    for page in contents.iter_mut() {
        let taken = std::mem::take(page);
        match passes::detect_lists(taken) {
            Ok(detected) => *page = detected,
            Err(err) => log::warn!("list re-detection failed: {}", err),
        }
    }

    stitch_list_continuations(contents);
    merge_neighbor_tables(contents);
    assign_heading_levels(contents);
    detect_outline_levels(contents);
}

/// Remove recurring page decoration from the top and bottom page zones.
///
/// Text objects in the edge zones are keyed by their digit-normalized text;
/// a key recurring on at least half the pages (and at least two) is
/// furniture and is dropped everywhere.
fn remove_headers_and_footers(ctx: &RunContext, contents: &mut [Vec<ContentObject>]) {
    let page_count = contents.iter().filter(|p| !p.is_empty()).count();
    if page_count < MIN_RECURRENCE {
        return;
    }
    let threshold = MIN_RECURRENCE.max(page_count / 2);

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for (page_index, page) in contents.iter().enumerate() {
        for object in page {
            if let Some(key) = furniture_key(ctx, page_index, object) {
                *occurrences.entry(key).or_insert(0) += 1;
            }
        }
    }

    for (page_index, page) in contents.iter_mut().enumerate() {
        page.retain(|object| {
            furniture_key(ctx, page_index, object)
                .map(|key| occurrences.get(&key).copied().unwrap_or(0) < threshold)
                .unwrap_or(true)
        });
    }
}

/// Recurrence key for an edge-zone text object, `None` for body content.
fn furniture_key(ctx: &RunContext, page_index: usize, object: &ContentObject) -> Option<String> {
    let text = match &object.kind {
        ContentKind::Paragraph(_) | ContentKind::TextLine(_) | ContentKind::Heading(_) => {
            object.plain_text()
        }
        _ => return None,
    };

    let height = ctx.page_height(page_index);
    let in_top = object.bbox.bottom >= height * (1.0 - EDGE_ZONE_RATIO);
    let in_bottom = object.bbox.top <= height * EDGE_ZONE_RATIO;
    if !in_top && !in_bottom {
        return None;
    }

    // Page numbers vary per page; normalizing digits makes them recur.
    let normalized: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_digit() { '#' } else { c })
        .collect();
    if normalized.is_empty() {
        return None;
    }

    Some(format!("{}|{}", if in_top { "top" } else { "bottom" }, normalized))
}

/// Stitch a list continued across a page boundary back into one list.
fn stitch_list_continuations(contents: &mut [Vec<ContentObject>]) {
    for page_index in 1..contents.len() {
        let (head, tail) = contents.split_at_mut(page_index);
        let prev_page = match head.last_mut() {
            Some(page) => page,
            None => continue,
        };
        let next_page = &mut tail[0];

        let continues = match (prev_page.last(), next_page.first()) {
            (Some(prev), Some(next)) => lists_continue(prev, next),
            _ => false,
        };
        if !continues {
            continue;
        }

        let continuation = next_page.remove(0);
        if let (
            Some(ContentObject {
                kind: ContentKind::List(prev_list),
                ..
            }),
            ContentKind::List(next_list),
        ) = (prev_page.last_mut(), continuation.kind)
        {
            prev_list.items.extend(next_list.items);
        }
    }
}

fn lists_continue(prev: &ContentObject, next: &ContentObject) -> bool {
    let (prev_list, next_list) = match (&prev.kind, &next.kind) {
        (ContentKind::List(a), ContentKind::List(b)) => (a, b),
        _ => return false,
    };

    if prev_list.ordered != next_list.ordered {
        return false;
    }

    if prev_list.ordered {
        let last = prev_list.items.last().and_then(|i| marker_number(&i.marker));
        let first = next_list.items.first().and_then(|i| marker_number(&i.marker));
        matches!((last, first), (Some(a), Some(b)) if b == a + 1)
    } else {
        let last = prev_list.items.last().map(|i| i.marker.as_str());
        let first = next_list.items.first().map(|i| i.marker.as_str());
        last == first
    }
}

fn marker_number(marker: &str) -> Option<u32> {
    let digits: String = marker.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Merge a table that spills onto the next page into its first part.
fn merge_neighbor_tables(contents: &mut [Vec<ContentObject>]) {
    for page_index in 1..contents.len() {
        let (head, tail) = contents.split_at_mut(page_index);
        let prev_page = match head.last_mut() {
            Some(page) => page,
            None => continue,
        };
        let next_page = &mut tail[0];

        let compatible = match (prev_page.last(), next_page.first()) {
            (
                Some(ContentObject {
                    kind: ContentKind::Table(a),
                    ..
                }),
                Some(ContentObject {
                    kind: ContentKind::Table(b),
                    ..
                }),
            ) => a.col_count == b.col_count && a.col_count > 0,
            _ => false,
        };
        if !compatible {
            continue;
        }

        let continuation = next_page.remove(0);
        if let (
            Some(ContentObject {
                kind: ContentKind::Table(prev_table),
                ..
            }),
            ContentKind::Table(next_table),
        ) = (prev_page.last_mut(), continuation.kind)
        {
            let row_offset = prev_table.row_count;
            for mut cell in next_table.cells {
                cell.row += row_offset;
                prev_table.cells.push(cell);
            }
            prev_table.row_count += next_table.row_count;
        }
    }
}

/// Assign heading levels document-wide by font-size rank.
fn assign_heading_levels(contents: &mut [Vec<ContentObject>]) {
    let mut sizes: Vec<i64> = contents
        .iter()
        .flatten()
        .filter_map(|o| match &o.kind {
            ContentKind::Heading(h) => Some(size_bucket(h.font_size)),
            _ => None,
        })
        .collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes.dedup();

    if sizes.is_empty() {
        return;
    }

    for object in contents.iter_mut().flatten() {
        if let ContentKind::Heading(heading) = &mut object.kind {
            let rank = sizes
                .iter()
                .position(|&s| s == size_bucket(heading.font_size))
                .unwrap_or(0);
            heading.level = (rank as u8 + 1).min(6);
        }
    }
}

/// Bucket a font size to half-point granularity for ranking.
fn size_bucket(size: f64) -> i64 {
    (size * 2.0).round() as i64
}

/// Assign structural outline levels across the whole document.
///
/// A heading carries its own level; everything after it nests one level
/// below, until the next heading.
fn detect_outline_levels(contents: &mut [Vec<ContentObject>]) {
    let mut current: Option<u8> = None;

    for page in contents.iter_mut() {
        for object in page.iter_mut() {
            match &object.kind {
                ContentKind::Heading(heading) => {
                    current = Some(heading.level);
                    object.outline_level = Some(heading.level);
                }
                _ => {
                    object.outline_level = current.map(|level| (level + 1).min(6));
                }
            }
        }
    }
}
