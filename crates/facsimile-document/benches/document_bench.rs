// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the facsimile-document crate: OCR XML parsing and
// justified line rendering, the two per-line hot paths of an assembly run.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use facsimile_document::pdf::justify::{Alignment, CellRect, draw};
use facsimile_document::pdf::{DocumentBuilder, FontSet, FontStyle};
use facsimile_document::OcrDocument;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A synthetic OCR file: `pages` pages of 40 lines with 8 words each.
fn synthetic_ocr(pages: usize) -> String {
    let mut xml = String::from("<DjVuXML><BODY>");
    for page in 1..=pages {
        xml.push_str(&format!(
            r#"<OBJECT><PARAM name="PAGE" value="bench_{page:04}.djvu"/><PARAM name="DPI" value="400"/><HIDDENTEXT><PAGECOLUMN><REGION><PARAGRAPH>"#
        ));
        for line in 0..40 {
            let top = 100 + line * 60;
            xml.push_str("<LINE>");
            for word in 0..8 {
                let left = 100 + word * 250;
                xml.push_str(&format!(
                    r#"<WORD coords="{left},{},{},{top},0">specimen</WORD>"#,
                    top + 45,
                    left + 220
                ));
            }
            xml.push_str("</LINE>");
        }
        xml.push_str("</PARAGRAPH></REGION></PAGECOLUMN></HIDDENTEXT></OBJECT>");
    }
    xml.push_str("</BODY></DjVuXML>");
    xml
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Parse a ten-page OCR file (3200 words).
fn bench_ocr_parse(c: &mut Criterion) {
    let xml = synthetic_ocr(10);
    c.bench_function("ocr_parse (10 pages)", |b| {
        b.iter(|| {
            let doc = OcrDocument::parse(black_box(&xml)).unwrap();
            black_box(doc.page_count());
        });
    });
}

/// Render one page's worth of fully justified lines.
fn bench_justify(c: &mut Criterion) {
    let line = "Rana temporaria Linnaeus collected near the river in spring";
    c.bench_function("justify (40 lines)", |b| {
        b.iter(|| {
            let mut builder = DocumentBuilder::new(FontSet::standard());
            builder.add_page(210.0, 297.0).unwrap();
            builder.set_font(FontStyle::Regular, 10.0);
            for row in 0..40 {
                let rect = CellRect::new(15.0, 15.0 + row as f64 * 6.5, 180.0, 5.0);
                black_box(draw(&mut builder, rect, black_box(line), Alignment::FullJustify).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_ocr_parse, bench_justify);
criterion_main!(benches);
