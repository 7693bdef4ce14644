//! Page text as delivered by the PDF renderer: pages, blocks, lines, spans.

use crate::error::ExtractError;
use crate::utils::normalize_chars;
use serde::{Deserialize, Serialize};

/// Separator placed between cells of one visual row.
pub const CELL_SEPARATOR: &str = "\t\t";

/// Vertical distance under which two spans sit on the same row.
const ROW_TOLERANCE: f64 = 3.0;

/// Minimum page size assumed when computing the header region.
const MIN_PAGE_WIDTH: f64 = 600.0;
const MIN_PAGE_HEIGHT: f64 = 800.0;

/// Axis-aligned box in page coordinates, serialized as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
}

impl Rect {
    /// Creates a box from its edges.
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        (self.x1 - self.x0).max(0.0) * (self.y1 - self.y0).max(0.0)
    }

    /// Whether a point lies inside the box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

impl From<[f64; 4]> for Rect {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<Rect> for [f64; 4] {
    fn from(rect: Rect) -> Self {
        [rect.x0, rect.y0, rect.x1, rect.y1]
    }
}

/// A run of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Span text.
    pub text: String,
    /// Span position.
    pub bbox: Rect,
}

/// A line of spans inside a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Spans, left to right.
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// A text block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block position.
    #[serde(default)]
    pub bbox: Rect,
    /// Lines, top to bottom.
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Block {
    /// Plain text of the block, one output line per line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                let joined: Vec<&str> = line.spans.iter().map(|s| s.text.as_str()).collect();
                normalize_chars(joined.join(" ").chars())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page width.
    #[serde(default)]
    pub width: f64,
    /// Page height.
    #[serde(default)]
    pub height: f64,
    /// Blocks in renderer order.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    /// Region holding the investor address: top half, left 60% of the page.
    ///
    /// Degenerate pages yield a zero-area region.
    pub fn header_region(&self) -> Rect {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Rect::default();
        }
        let width = self.width.max(MIN_PAGE_WIDTH);
        let height = self.height.max(MIN_PAGE_HEIGHT);
        Rect::new(0.0, 0.0, width * 3.0 / 5.0, height / 2.0)
    }

    /// Visual rows of the page, cells joined by [`CELL_SEPARATOR`].
    pub fn rows(&self) -> Vec<String> {
        rows_of(self.spans().collect())
    }

    /// Rows built only from spans whose origin lies inside `region`.
    pub fn rows_in(&self, region: Rect) -> Vec<String> {
        rows_of(
            self.spans()
                .filter(|span| region.contains(span.bbox.x0, span.bbox.y0))
                .collect(),
        )
    }

    fn spans(&self) -> impl Iterator<Item = &Span> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
            .filter(|s| !s.text.trim().is_empty())
    }
}

/// Groups spans into rows by vertical position, then orders each row left to right.
fn rows_of(mut spans: Vec<&Span>) -> Vec<String> {
    spans.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut rows: Vec<(f64, Vec<&Span>)> = Vec::new();
    for span in spans {
        match rows.last_mut() {
            Some((top, cells)) if (span.bbox.y0 - *top).abs() <= ROW_TOLERANCE => cells.push(span),
            _ => rows.push((span.bbox.y0, vec![span])),
        }
    }

    rows.into_iter()
        .map(|(_, mut cells)| {
            cells.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            cells
                .iter()
                .map(|s| normalize_chars(s.text.chars()))
                .collect::<Vec<_>>()
                .join(CELL_SEPARATOR)
        })
        .collect()
}

/// The PDF rendering collaborator: decrypts a document and lays out its text.
pub trait PdfExtractor {
    /// Returns the pages of the document, or why they could not be produced.
    fn extract(&self, bytes: &[u8], password: &str) -> Result<Vec<Page>, ExtractError>;
}

/// Reads pages from a JSON page dump written by the renderer.
///
/// A dump is either a bare array of pages or an object `{"password", "pages"}`
/// that keeps the source document's password; the latter only opens with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDumpExtractor;

#[derive(Deserialize)]
#[serde(untagged)]
enum PageDump {
    Pages(Vec<Page>),
    Protected { password: String, pages: Vec<Page> },
}

impl PdfExtractor for PageDumpExtractor {
    fn extract(&self, bytes: &[u8], password: &str) -> Result<Vec<Page>, ExtractError> {
        let dump: PageDump =
            serde_json::from_slice(bytes).map_err(|err| ExtractError::Corrupt(err.to_string()))?;
        match dump {
            PageDump::Pages(pages) => Ok(pages),
            PageDump::Protected { password: expected, pages } if expected == password => Ok(pages),
            PageDump::Protected { .. } => Err(ExtractError::IncorrectPassword),
        }
    }
}
