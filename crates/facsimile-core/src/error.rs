// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Facsimile.

use thiserror::Error;

/// Top-level error type for all Facsimile operations.
///
/// Every variant aborts the current assembly run; nothing here is retried
/// internally.
#[derive(Debug, Error)]
pub enum FacsimileError {
    // -- Source errors --
    #[error("malformed OCR source: {0}")]
    MalformedSource(String),

    #[error("unknown page: {0}")]
    UnknownPage(String),

    // -- Image errors --
    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("not an image: {0}")]
    NotAnImage(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    // -- Output errors --
    #[error("font error: {0}")]
    Font(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("metadata tagging failed: {0}")]
    Tagging(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FacsimileError {
    /// Whether a caller may reasonably retry the run that produced this error.
    ///
    /// Only page lookups qualify: the page ordering may have been refreshed
    /// upstream in the meantime. Everything else is a property of the inputs.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::UnknownPage(_) | Self::Io(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FacsimileError>;
