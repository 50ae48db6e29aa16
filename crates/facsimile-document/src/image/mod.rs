// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan images: validation, resizing, desaturation and JPEG embedding.

pub mod processor;

pub use processor::{ColorSpace, EmbeddedImage, PageImage, ScanSource};
