// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page building, fonts, justified and flowing text, and reading
// finished documents back.

pub mod builder;
pub mod flow;
pub mod font;
pub mod justify;
pub mod reader;

pub use builder::{DocumentBuilder, DocumentInfo, ImageHandle, Rgb, TextRenderMode};
pub use font::{FontSet, FontStyle, TextEncoding, Typeface};
pub use justify::{Alignment, CellOptions, CellRect, LinePlan};
pub use reader::PdfReader;
