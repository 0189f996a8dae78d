//! Semantic content objects.
//!
//! A [`ContentObject`] is one semantic unit on a page: a text line fresh
//! from filtering, or a paragraph, heading, list, table, figure, or formula
//! produced by the local detection passes or by a backend schema
//! transformer. Objects are owned by their page's content sequence.

use super::{BoundingBox, TableGrid};
use serde::{Deserialize, Serialize};

/// A semantic content unit with its page-relative geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentObject {
    /// Stable content identifier, assigned once per object by the ID pass
    pub id: Option<u64>,

    /// Bounding box in points, bottom-left origin
    pub bbox: BoundingBox,

    /// Structural nesting level within the document outline, assigned by
    /// the cross-page level pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline_level: Option<u8>,

    /// Type-specific payload
    pub kind: ContentKind,
}

impl ContentObject {
    /// Create a new content object without an assigned ID.
    pub fn new(bbox: BoundingBox, kind: ContentKind) -> Self {
        Self {
            id: None,
            bbox,
            outline_level: None,
            kind,
        }
    }

    /// Create a raw text line.
    pub fn text_line(bbox: BoundingBox, line: TextLine) -> Self {
        Self::new(bbox, ContentKind::TextLine(line))
    }

    /// Create a paragraph from plain text.
    pub fn paragraph(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self::new(
            bbox,
            ContentKind::Paragraph(Paragraph {
                text: text.into(),
                font_size: DEFAULT_FONT_SIZE,
            }),
        )
    }

    /// Create a heading at the given nesting level.
    pub fn heading(bbox: BoundingBox, text: impl Into<String>, level: u8) -> Self {
        Self::new(
            bbox,
            ContentKind::Heading(Heading {
                text: text.into(),
                level,
                font_size: DEFAULT_FONT_SIZE,
            }),
        )
    }

    /// Short name of the payload kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ContentKind::TextLine(_) => "text_line",
            ContentKind::Paragraph(_) => "paragraph",
            ContentKind::Heading(_) => "heading",
            ContentKind::List(_) => "list",
            ContentKind::Table(_) => "table",
            ContentKind::Figure(_) => "figure",
            ContentKind::Formula(_) => "formula",
        }
    }

    /// Plain text carried by this object, if any.
    pub fn plain_text(&self) -> String {
        match &self.kind {
            ContentKind::TextLine(line) => line.text.clone(),
            ContentKind::Paragraph(p) => p.text.clone(),
            ContentKind::Heading(h) => h.text.clone(),
            ContentKind::List(l) => l
                .items
                .iter()
                .map(|i| i.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            ContentKind::Table(t) => t.plain_text(),
            ContentKind::Figure(f) => f.caption.clone().unwrap_or_default(),
            ContentKind::Formula(f) => f.source.clone(),
        }
    }

    /// Dominant font size, where the payload carries one.
    pub fn font_size(&self) -> Option<f64> {
        match &self.kind {
            ContentKind::TextLine(line) => Some(line.font_size),
            ContentKind::Paragraph(p) => Some(p.font_size),
            ContentKind::Heading(h) => Some(h.font_size),
            _ => None,
        }
    }

    /// Check if this object is a raw text line.
    pub fn is_text_line(&self) -> bool {
        matches!(self.kind, ContentKind::TextLine(_))
    }

    /// Check if this object is a table.
    pub fn is_table(&self) -> bool {
        matches!(self.kind, ContentKind::Table(_))
    }

    /// Check if this object is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, ContentKind::Heading(_))
    }
}

/// Font size assumed for backend-born text, which carries no font metrics.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Type-specific payload of a [`ContentObject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentKind {
    /// A raw text line, as produced by the page content filter
    TextLine(TextLine),

    /// A paragraph of body text
    Paragraph(Paragraph),

    /// A heading with a nesting level
    Heading(Heading),

    /// An ordered or unordered list
    List(List),

    /// A table grid
    Table(TableGrid),

    /// A figure / image reference
    Figure(Figure),

    /// A formula
    Formula(Formula),
}

/// A raw text line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Line text
    pub text: String,

    /// Dominant font size in points
    pub font_size: f64,

    /// Whether the dominant font appears bold
    pub bold: bool,
}

impl TextLine {
    /// Create a text line with a regular-weight font.
    pub fn new(text: impl Into<String>, font_size: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold: false,
        }
    }

    /// Mark the line as bold and return it.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A paragraph of body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph text
    pub text: String,

    /// Dominant font size in points
    pub font_size: f64,
}

/// A heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    /// Heading text
    pub text: String,

    /// Nesting level (1 = top)
    pub level: u8,

    /// Dominant font size in points
    pub font_size: f64,
}

/// An ordered or unordered list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    /// List items in reading order
    pub items: Vec<ListItem>,

    /// Whether markers form a numbered sequence
    pub ordered: bool,
}

/// One item of a [`List`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    /// The literal marker ("1.", "-", "a)")
    pub marker: String,

    /// Item text without the marker
    pub text: String,

    /// Item bounding box
    pub bbox: BoundingBox,
}

/// A figure / image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    /// Sequential image index within the document run
    pub image_index: u32,

    /// Attached caption text, if detected
    pub caption: Option<String>,
}

/// A formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Formula source (LaTeX or backend-native)
    pub source: String,
}
