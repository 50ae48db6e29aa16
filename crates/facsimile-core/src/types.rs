// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry types shared by the planner, the renderer and the assembler.

use serde::{Deserialize, Serialize};

/// Page orientation of an output page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Portrait when strictly taller than wide, landscape otherwise.
    pub fn from_dimensions(width: f64, height: f64) -> Self {
        if height > width {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }

    /// Single-letter tag used in log output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Portrait => "P",
            Self::Landscape => "L",
        }
    }
}

/// How output page sizes are derived from the source scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Every page gets its own canvas sized exactly to its scan.
    #[default]
    PerPage,
    /// One shared canvas and scale for the whole document; smaller scans are
    /// centred on it.
    UniformDocument,
}

/// Reference physical page dimensions, in millimetres.
///
/// Under the uniform policy this is a seed ratio, not a hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Envelope {
    pub const A4: Envelope = Envelope {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    pub const LETTER: Envelope = Envelope {
        width_mm: 215.9,
        height_mm: 279.4,
    };

    pub fn new(width_mm: f64, height_mm: f64) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height_mm / self.width_mm
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::A4
    }
}

/// Pixel dimensions of one source scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageImageSpec {
    pub width_px: u32,
    pub height_px: u32,
}

impl PageImageSpec {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Dimensions after applying a resize factor, truncated to whole pixels.
    pub fn scaled(&self, factor: f64) -> (u32, u32) {
        (
            (self.width_px as f64 * factor) as u32,
            (self.height_px as f64 * factor) as u32,
        )
    }
}

/// Output geometry for a single page. Computed at assembly time, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageLayout {
    pub orientation: Orientation,
    /// Canvas width in millimetres.
    pub width_mm: f64,
    /// Canvas height in millimetres.
    pub height_mm: f64,
    /// Device units (scaled source pixels) per millimetre.
    pub dpmm: f64,
    /// Horizontal slack half: left edge of the scan on the canvas.
    pub offset_x_mm: f64,
    /// Vertical slack half: top edge of the scan on the canvas.
    pub offset_y_mm: f64,
    /// Scan width on the canvas.
    pub image_width_mm: f64,
    /// Scan height on the canvas.
    pub image_height_mm: f64,
}

impl PageLayout {
    /// Whether the scan fills the canvas with no letterboxing.
    pub fn is_exact(&self) -> bool {
        self.offset_x_mm.abs() < f64::EPSILON && self.offset_y_mm.abs() < f64::EPSILON
    }
}

/// Rendering of the OCR text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextLayer {
    /// Searchable but not painted (text render mode 3).
    #[default]
    Invisible,
    /// Painted over the scan, for checking registration by eye.
    Visible,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_square_is_landscape() {
        assert_eq!(Orientation::from_dimensions(100.0, 100.0), Orientation::Landscape);
        assert_eq!(Orientation::from_dimensions(100.0, 101.0), Orientation::Portrait);
    }

    #[test]
    fn scaled_truncates() {
        let spec = PageImageSpec::new(1001, 1399);
        assert_eq!(spec.scaled(0.5), (500, 699));
        assert_eq!(spec.scaled(1.0), (1001, 1399));
    }

    #[test]
    fn a4_ratio() {
        assert!((Envelope::A4.aspect_ratio() - 297.0 / 210.0).abs() < 1e-12);
    }

    #[test]
    fn policy_serialises_snake_case() {
        let json = serde_json::to_string(&SizingPolicy::UniformDocument).unwrap();
        assert_eq!(json, "\"uniform_document\"");
    }
}
