// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-build audit: page count and boilerplate checks on a finished file,
// plus a SHA-256 fingerprint of its bytes.

use facsimile_core::biblio::BHL_BOILERPLATE;
use facsimile_core::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::pdf::reader::PdfReader;

/// Outcome of auditing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub page_count: usize,
    pub expected_pages: usize,
    /// The last page carries the boilerplate sentence as extractable text.
    pub has_boilerplate: bool,
    pub sha256: String,
}

impl AuditReport {
    pub fn page_count_matches(&self) -> bool {
        self.page_count == self.expected_pages
    }

    pub fn passed(&self) -> bool {
        self.page_count_matches() && self.has_boilerplate
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Audit a finished document built from `source_pages` scans. With a cover
/// the document should hold one page more than its sources.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn audit(bytes: &[u8], source_pages: usize, with_cover: bool) -> Result<AuditReport> {
    let reader = PdfReader::from_bytes(bytes)?;
    let page_count = reader.page_count();
    let expected_pages = source_pages + usize::from(with_cover);

    let has_boilerplate = match u32::try_from(page_count) {
        Ok(last) if last > 0 => reader.page_text(last)?.contains(BHL_BOILERPLATE),
        _ => false,
    };

    let report = AuditReport {
        page_count,
        expected_pages,
        has_boilerplate,
        sha256: hash_bytes(bytes),
    };
    if report.passed() {
        info!(page_count, sha256 = %report.sha256, "Audit passed");
    } else {
        warn!(
            page_count,
            expected_pages,
            has_boilerplate,
            "Audit failed"
        );
    }
    Ok(report)
}
