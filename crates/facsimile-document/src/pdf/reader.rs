// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open finished documents and inspect page count, page sizes,
// info strings and page text using the `lopdf` crate.

use std::path::Path;

use facsimile_core::error::{FacsimileError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use super::builder::points_per_mm;

/// Reads existing PDF files.
pub struct PdfReader {
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            FacsimileError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            FacsimileError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// MediaBox width and height of a page (1-indexed), in millimetres.
    pub fn page_size_mm(&self, page_number: u32) -> Result<(f64, f64)> {
        let page = self.page_dictionary(page_number)?;
        let media_box = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .map_err(|err| FacsimileError::Pdf(format!("page {page_number}: no MediaBox: {err}")))?;
        let coords: Vec<f64> = media_box
            .iter()
            .filter_map(|o| o.as_float().ok())
            .map(f64::from)
            .collect();
        match coords.as_slice() {
            [x0, y0, x1, y1] => {
                let k = points_per_mm();
                Ok(((x1 - x0) / k, (y1 - y0) / k))
            }
            _ => Err(FacsimileError::Pdf(format!(
                "page {page_number}: malformed MediaBox"
            ))),
        }
    }

    /// A string entry of the document information dictionary. UTF-16BE and
    /// UTF-8 strings are recognised by their byte-order mark; anything else
    /// is PDFDocEncoding.
    pub fn info_string(&self, key: &str) -> Option<String> {
        let info = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())?;
        let value = info.get(key.as_bytes()).ok()?;
        match lopdf::decode_text_string(value) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(key, %err, "Undecodable info string");
                None
            }
        }
    }

    // -- Text extraction ------------------------------------------------------

    /// Words shown on a page (1-indexed), separated by single spaces. Each
    /// font's own encoding is honoured, including ToUnicode maps on embedded
    /// subsets.
    #[instrument(skip(self))]
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.page_id(page_number)?;
        let text = self
            .document
            .extract_text(&[page_number])
            .map_err(|err| FacsimileError::Pdf(format!("page {page_number}: {err}")))?;
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            FacsimileError::Pdf(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    fn page_dictionary(&self, page_number: u32) -> Result<&Dictionary> {
        let id = self.page_id(page_number)?;
        self.document
            .get_dictionary(id)
            .map_err(|err| FacsimileError::Pdf(format!("page {page_number}: {err}")))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::builder::{DocumentBuilder, DocumentInfo};
    use crate::pdf::flow;
    use crate::pdf::font::{FontSet, FontStyle};

    fn sample() -> Vec<u8> {
        let mut builder = DocumentBuilder::new(FontSet::standard().unwrap());
        builder.set_margins(20.0, 20.0, 20.0);
        builder.add_page(210.0, 297.0).unwrap();
        builder.set_font(FontStyle::Regular, 11.0);
        flow::write(&mut builder, 5.0, "Caf\u{e9} at the ", None).unwrap();
        builder.set_font(FontStyle::Bold, 11.0);
        flow::write(&mut builder, 5.0, "Museum", None).unwrap();
        builder.ln(5.0);
        builder.set_font(FontStyle::Regular, 11.0);
        flow::write(&mut builder, 5.0, "second line", None).unwrap();
        builder
            .finish(&DocumentInfo {
                title: "\u{201C}Quoted\u{201D}".into(),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn extracts_words_across_fonts_and_lines() {
        let reader = PdfReader::from_bytes(&sample()).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert_eq!(
            reader.page_text(1).unwrap(),
            "Caf\u{e9} at the Museum second line"
        );
    }

    #[test]
    fn embedded_subsets_extract_through_their_unicode_maps() {
        let mut builder = DocumentBuilder::new(FontSet::bundled().unwrap());
        builder.add_page(210.0, 297.0).unwrap();
        builder.set_font(FontStyle::Italic, 12.0);
        flow::write(&mut builder, 6.0, "\u{141}\u{f3}d\u{17a} \u{3b1}\u{3b2}\u{3b3}", None).unwrap();
        let bytes = builder.finish(&DocumentInfo::default()).unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(
            reader.page_text(1).unwrap(),
            "\u{141}\u{f3}d\u{17a} \u{3b1}\u{3b2}\u{3b3}"
        );
    }

    #[test]
    fn reads_page_size_and_info() {
        let reader = PdfReader::from_bytes(&sample()).unwrap();
        let (w, h) = reader.page_size_mm(1).unwrap();
        assert!((w - 210.0).abs() < 0.01 && (h - 297.0).abs() < 0.01);
        assert_eq!(
            reader.info_string("Title").as_deref(),
            Some("\u{201C}Quoted\u{201D}")
        );
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let reader = PdfReader::from_bytes(&sample()).unwrap();
        assert!(reader.page_text(2).is_err());
        assert!(reader.source_path().is_none());
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(FacsimileError::Pdf(_))
        ));
    }
}
