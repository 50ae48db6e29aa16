// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR geometry: DjVu XML parsing and coordinate transforms.

pub mod djvu;
pub mod model;

pub use model::{BoundingBox, OcrDocument, OcrLibrary, OcrLine, OcrPage, OcrWord, PlacedText};
