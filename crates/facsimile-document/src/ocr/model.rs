// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory OCR geometry: pages, lines and words in source-pixel space.

use std::collections::HashMap;

use facsimile_core::error::{FacsimileError, Result};
use tracing::debug;

/// Axis-aligned box in source pixels. Always normalised so `x2 >= x1` and
/// `y2 >= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
}

/// A line of words in reading order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    words: Vec<OcrWord>,
    bbox: BoundingBox,
}

impl OcrLine {
    /// Build a line from its words; `None` when there are none.
    pub fn from_words(words: Vec<OcrWord>) -> Option<Self> {
        let first = words.first()?.bbox;
        let bbox = words.iter().fold(first, |acc, w| acc.union(&w.bbox));
        Some(Self { words, bbox })
    }

    pub fn words(&self) -> &[OcrWord] {
        &self.words
    }

    /// Envelope of all word boxes.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrPage {
    /// Page-file-name stem, e.g. `mobot31753002433636_0012`.
    pub id: String,
    /// Source resolution in dots per inch. Always positive.
    pub dpi: f64,
    /// 1-based position in the OCR file.
    pub sequence: usize,
    pub lines: Vec<OcrLine>,
}

/// Text with a box already transformed into output units.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PlacedText {
    fn transform(text: String, bbox: &BoundingBox, scale: f64, divisor: f64) -> Self {
        let k = scale / divisor;
        Self {
            text,
            x: bbox.x1 * k,
            y: bbox.y1 * k,
            w: bbox.width() * k,
            h: bbox.height() * k,
        }
    }
}

/// Parsed OCR file. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct OcrDocument {
    pages: HashMap<String, OcrPage>,
    sequence: Vec<String>,
}

impl OcrDocument {
    pub(crate) fn from_pages(pages: Vec<OcrPage>) -> Self {
        let mut doc = Self::default();
        for page in pages {
            doc.sequence.push(page.id.clone());
            doc.pages.insert(page.id.clone(), page);
        }
        doc
    }

    pub fn page_count(&self) -> usize {
        self.sequence.len()
    }

    pub fn page(&self, page_id: &str) -> Option<&OcrPage> {
        self.pages.get(page_id)
    }

    /// Pages in file order.
    pub fn pages(&self) -> impl Iterator<Item = &OcrPage> {
        self.sequence.iter().filter_map(|id| self.pages.get(id))
    }

    /// Identifier of the page at a 1-based position in the OCR file.
    pub fn page_identifier_at_sequence(&self, seq: usize) -> Option<&str> {
        seq.checked_sub(1)
            .and_then(|i| self.sequence.get(i))
            .map(String::as_str)
    }

    fn resolve(&self, page_id: &str, divisor: Option<f64>) -> Result<(&OcrPage, f64)> {
        let page = self
            .pages
            .get(page_id)
            .ok_or_else(|| FacsimileError::UnknownPage(page_id.to_string()))?;
        let divisor = match divisor {
            Some(d) if d != 0.0 => d,
            _ => page.dpi,
        };
        Ok((page, divisor))
    }

    /// Every line of a page with coordinates mapped as
    /// `coord * scale / divisor`. A missing or zero divisor selects the page's
    /// own DPI.
    pub fn lines_for_page(
        &self,
        page_id: &str,
        scale: f64,
        divisor: Option<f64>,
    ) -> Result<Vec<PlacedText>> {
        let (page, divisor) = self.resolve(page_id, divisor)?;
        debug!(page_id, lines = page.lines.len(), divisor, "Transforming lines");
        Ok(page
            .lines
            .iter()
            .map(|line| PlacedText::transform(line.text(), &line.bbox(), scale, divisor))
            .collect())
    }

    /// Every word of a page, same transform as [`OcrDocument::lines_for_page`].
    pub fn words_for_page(
        &self,
        page_id: &str,
        scale: f64,
        divisor: Option<f64>,
    ) -> Result<Vec<PlacedText>> {
        let (page, divisor) = self.resolve(page_id, divisor)?;
        Ok(page
            .lines
            .iter()
            .flat_map(|line| line.words())
            .map(|word| PlacedText::transform(word.text.clone(), &word.bbox, scale, divisor))
            .collect())
    }
}

/// OCR documents for one article, keyed by source (scanned volume) identifier.
#[derive(Debug, Default)]
pub struct OcrLibrary {
    sources: HashMap<String, OcrDocument>,
}

impl OcrLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, document: OcrDocument) {
        self.sources.insert(source.into(), document);
    }

    pub fn get(&self, source: &str) -> Result<&OcrDocument> {
        self.sources
            .get(source)
            .ok_or_else(|| FacsimileError::UnknownPage(format!("no OCR source named {source}")))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
