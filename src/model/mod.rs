//! Content model types for hybrid document processing.
//!
//! This module defines the backend-agnostic object model every processing
//! path converges on: page-relative geometry in points with a bottom-left
//! origin, and semantic content objects owned by per-page sequences.

mod bbox;
mod content;
mod document;
mod table;

pub use bbox::{BoundingBox, SAME_LINE_TOLERANCE};
pub use content::{
    ContentKind, ContentObject, Figure, Formula, Heading, List, ListItem, Paragraph, TextLine,
    DEFAULT_FONT_SIZE,
};
pub use document::{InputDocument, PageInfo, PageSelection};
pub use table::{CellSpec, TableCell, TableGrid};
