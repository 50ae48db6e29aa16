// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// facsimile-document: searchable facsimile PDFs of library articles.
//
// Parses OCR geometry, plans output page sizes from scan dimensions, draws
// each OCR line fully justified over its scan, appends a citation and rights
// cover page, and audits finished files.

pub mod assemble;
pub mod audit;
pub mod cover;
pub mod image;
pub mod layout;
pub mod ocr;
pub mod pdf;
pub mod tagging;

// Re-export the primary types so callers can use `facsimile_document::Assembly` etc.
pub use assemble::{ArticleInputs, Assembly, AssemblyOptions, SourcePage, assemble};
pub use audit::{AuditReport, audit};
pub use cover::CoverPage;
pub use crate::image::{EmbeddedImage, PageImage, ScanSource};
pub use layout::plan;
pub use ocr::{OcrDocument, OcrLibrary};
pub use pdf::{DocumentBuilder, DocumentInfo, FontSet, PdfReader};
pub use tagging::{ExifTool, MetadataTagger, XmpTags};
