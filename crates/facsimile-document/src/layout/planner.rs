// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry planner.
//
// Turns scan pixel dimensions and a reference envelope into one
// `PageLayout` per page. Pixel dimensions are taken after the resize factor
// and truncated to whole pixels, the same values the embedded images end up
// with, so OCR coordinates scaled by the same factor stay in register.

use facsimile_core::error::{FacsimileError, Result};
use facsimile_core::types::{Envelope, Orientation, PageImageSpec, PageLayout, SizingPolicy};
use tracing::{debug, info, instrument};

/// Plan every page of a document under `policy`.
#[instrument(skip(images), fields(pages = images.len()))]
pub fn plan(
    images: &[PageImageSpec],
    scale: f64,
    envelope: Envelope,
    policy: SizingPolicy,
) -> Result<Vec<PageLayout>> {
    if !(scale > 0.0) {
        return Err(FacsimileError::DegenerateGeometry(format!(
            "resize factor must be positive, got {scale}"
        )));
    }
    if !(envelope.width_mm > 0.0 && envelope.height_mm > 0.0) {
        return Err(FacsimileError::DegenerateGeometry(format!(
            "envelope {}x{} mm",
            envelope.width_mm, envelope.height_mm
        )));
    }

    let mut scaled = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let (w, h) = image.scaled(scale);
        if w == 0 || h == 0 {
            return Err(FacsimileError::DegenerateGeometry(format!(
                "page {}: {}x{} px scaled by {} is empty",
                index + 1,
                image.width_px,
                image.height_px,
                scale
            )));
        }
        scaled.push((f64::from(w), f64::from(h)));
    }

    let layouts = match policy {
        SizingPolicy::UniformDocument => uniform(&scaled, envelope),
        SizingPolicy::PerPage => scaled
            .iter()
            .map(|&(w, h)| per_page(w, h, envelope))
            .collect(),
    };

    info!(?policy, pages = layouts.len(), "Page geometry planned");
    Ok(layouts)
}

/// One canvas for the whole document, fitted to the largest scan. Smaller
/// scans are centred on it.
fn uniform(scaled: &[(f64, f64)], envelope: Envelope) -> Vec<PageLayout> {
    let max_w = scaled.iter().map(|&(w, _)| w).fold(0.0, f64::max);
    let max_h = scaled.iter().map(|&(_, h)| h).fold(0.0, f64::max);
    if max_w == 0.0 {
        return Vec::new();
    }

    let dpmm = if max_h / max_w > envelope.aspect_ratio() {
        max_h / envelope.height_mm
    } else {
        max_w / envelope.width_mm
    };
    let width_mm = max_w / dpmm;
    let height_mm = max_h / dpmm;
    let orientation = Orientation::from_dimensions(width_mm, height_mm);
    debug!(dpmm, width_mm, height_mm, "Uniform canvas");

    scaled
        .iter()
        .map(|&(w, h)| {
            let image_width_mm = w / dpmm;
            let image_height_mm = h / dpmm;
            PageLayout {
                orientation,
                width_mm,
                height_mm,
                dpmm,
                offset_x_mm: (width_mm - image_width_mm) / 2.0,
                offset_y_mm: (height_mm - image_height_mm) / 2.0,
                image_width_mm,
                image_height_mm,
            }
        })
        .collect()
}

/// A canvas sized exactly to the scan. Portrait pages are scaled by height
/// against the envelope, landscape pages by width.
fn per_page(w: f64, h: f64, envelope: Envelope) -> PageLayout {
    let orientation = Orientation::from_dimensions(w, h);
    let dpmm = match orientation {
        Orientation::Portrait => h / envelope.height_mm,
        Orientation::Landscape => w / envelope.width_mm,
    };
    let (width_mm, height_mm) = (w / dpmm, h / dpmm);
    PageLayout {
        orientation,
        width_mm,
        height_mm,
        dpmm,
        offset_x_mm: 0.0,
        offset_y_mm: 0.0,
        image_width_mm: width_mm,
        image_height_mm: height_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn uniform_fits_to_width() {
        let images = [PageImageSpec::new(1000, 1400), PageImageSpec::new(1200, 1600)];
        let layouts = plan(&images, 1.0, Envelope::A4, SizingPolicy::UniformDocument).unwrap();
        assert_eq!(layouts.len(), 2);
        for layout in &layouts {
            assert!(close(layout.dpmm, 1200.0 / 210.0, 1e-9));
            assert!(close(layout.width_mm, 210.0, 1e-9));
            assert!(close(layout.height_mm, 280.0, 1e-9));
            assert_eq!(layout.orientation, Orientation::Portrait);
        }
        assert!(close(layouts[0].offset_x_mm, 17.5, 1e-9));
        assert!(close(layouts[0].offset_y_mm, 17.5, 1e-9));
        assert!(layouts[1].is_exact());
    }

    #[test]
    fn uniform_fits_to_height_for_tall_scans() {
        let images = [PageImageSpec::new(1000, 2000)];
        let layout = plan(&images, 1.0, Envelope::A4, SizingPolicy::UniformDocument).unwrap()[0];
        assert!(close(layout.dpmm, 2000.0 / 297.0, 1e-9));
        assert!(close(layout.height_mm, 297.0, 1e-9));
        assert!(layout.width_mm < 210.0);
    }

    #[test]
    fn uniform_canvas_spans_widest_and_tallest() {
        // Neither scan alone is A4 shaped; the shared canvas is their union.
        let images = [PageImageSpec::new(2100, 1000), PageImageSpec::new(1000, 2970)];
        let layouts = plan(&images, 1.0, Envelope::A4, SizingPolicy::UniformDocument).unwrap();
        assert!(close(layouts[0].width_mm, 210.0, 1e-9));
        assert!(close(layouts[0].height_mm, 297.0, 1e-9));
        assert!(close(layouts[0].offset_x_mm, 0.0, 1e-9));
        assert!(close(layouts[0].offset_y_mm, 98.5, 1e-9));
        assert!(close(layouts[1].offset_x_mm, 55.0, 1e-9));
    }

    #[test]
    fn per_page_landscape_has_no_slack() {
        let layout = plan(
            &[PageImageSpec::new(1200, 900)],
            1.0,
            Envelope::A4,
            SizingPolicy::PerPage,
        )
        .unwrap()[0];
        assert_eq!(layout.orientation, Orientation::Landscape);
        assert!(layout.is_exact());
        assert!(close(layout.dpmm, 1200.0 / 210.0, 1e-9));
        assert!(close(layout.width_mm, 210.0, 1e-9));
        assert!(close(layout.height_mm, 157.5, 1e-9));
    }

    #[test]
    fn per_page_portrait_scales_by_height() {
        let layout = plan(
            &[PageImageSpec::new(1000, 2970)],
            1.0,
            Envelope::A4,
            SizingPolicy::PerPage,
        )
        .unwrap()[0];
        assert_eq!(layout.orientation, Orientation::Portrait);
        assert!(close(layout.dpmm, 10.0, 1e-9));
        assert!(close(layout.width_mm, 100.0, 1e-9));
        assert!(close(layout.height_mm, 297.0, 1e-9));
    }

    #[test]
    fn square_scan_is_landscape() {
        let layout = plan(&[PageImageSpec::new(500, 500)], 1.0, Envelope::A4, SizingPolicy::PerPage)
            .unwrap()[0];
        assert_eq!(layout.orientation, Orientation::Landscape);
    }

    #[test]
    fn resize_factor_truncates_pixels() {
        let layout = plan(
            &[PageImageSpec::new(1201, 901)],
            0.5,
            Envelope::A4,
            SizingPolicy::PerPage,
        )
        .unwrap()[0];
        // 600 x 450 after truncation.
        assert!(close(layout.dpmm, 600.0 / 210.0, 1e-9));
        assert!(close(layout.height_mm, 450.0 / layout.dpmm, 1e-9));
    }

    #[test]
    fn degenerate_inputs_fail() {
        let zero = plan(&[PageImageSpec::new(0, 100)], 1.0, Envelope::A4, SizingPolicy::PerPage);
        assert!(matches!(zero, Err(FacsimileError::DegenerateGeometry(_))));
        let scale = plan(&[PageImageSpec::new(10, 10)], 0.0, Envelope::A4, SizingPolicy::PerPage);
        assert!(matches!(scale, Err(FacsimileError::DegenerateGeometry(_))));
        let envelope = plan(
            &[PageImageSpec::new(10, 10)],
            1.0,
            Envelope::new(0.0, 297.0),
            SizingPolicy::PerPage,
        );
        assert!(matches!(envelope, Err(FacsimileError::DegenerateGeometry(_))));
    }

    #[test]
    fn empty_input_plans_nothing() {
        let layouts = plan(&[], 1.0, Envelope::A4, SizingPolicy::UniformDocument).unwrap();
        assert!(layouts.is_empty());
    }
}
