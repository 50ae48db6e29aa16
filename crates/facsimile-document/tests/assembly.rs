// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end: OCR XML and scans in, audited PDF out.

use std::path::PathBuf;

use facsimile_core::biblio::{Author, BHL_BOILERPLATE, BiblioRecord, ItemRecord};
use facsimile_core::config::FontPaths;
use facsimile_core::types::{Envelope, PageImageSpec, SizingPolicy, TextLayer};
use facsimile_document::pdf::justify::{Alignment, LinePlan};
use facsimile_document::{
    ArticleInputs, AssemblyOptions, FontSet, OcrDocument, OcrLibrary, PdfReader, ScanSource,
    SourcePage, assemble, audit, plan,
};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use proptest::prelude::*;

const OCR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DjVuXML>
  <BODY>
    <OBJECT>
      <PARAM name="PAGE" value="frogs_0001.djvu"/>
      <PARAM name="DPI" value="300"/>
      <HIDDENTEXT><PAGECOLUMN><REGION><PARAGRAPH>
        <LINE>
          <WORD coords="40,80,200,50,0">Notes</WORD>
          <WORD coords="210,80,260,50,0">on</WORD>
          <WORD coords="270,80,360,50,0">frogs</WORD>
        </LINE>
        <LINE><WORD coords="40,140,300,110,0">Plate</WORD></LINE>
      </PARAGRAPH></REGION></PAGECOLUMN></HIDDENTEXT>
    </OBJECT>
    <OBJECT>
      <PARAM name="PAGE" value="frogs_0002.djvu"/>
      <PARAM name="DPI" value="300"/>
      <HIDDENTEXT><PAGECOLUMN><REGION><PARAGRAPH>
        <LINE><WORD coords="40,80,200,50,0">Second</WORD><WORD coords="210,80,360,50,0">page</WORD></LINE>
      </PARAGRAPH></REGION></PAGECOLUMN></HIDDENTEXT>
    </OBJECT>
  </BODY>
</DjVuXML>"#;

const UNICODE_OCR: &str = r#"<DjVuXML><BODY>
  <OBJECT><PARAM name="PAGE" value="wiesen_0001.djvu"/><PARAM name="DPI" value="300"/>
    <HIDDENTEXT><PAGECOLUMN><REGION><PARAGRAPH>
      <LINE>
        <WORD coords="40,80,200,50,0">Über</WORD>
        <WORD coords="210,80,330,50,0">łąka</WORD>
        <WORD coords="340,80,460,50,0">αβγ</WORD>
      </LINE>
    </PARAGRAPH></REGION></PAGECOLUMN></HIDDENTEXT>
  </OBJECT>
</BODY></DjVuXML>"#;

const UNICODE_LINE: &str = "\u{dc}ber \u{142}\u{105}ka \u{3b1}\u{3b2}\u{3b3}";

fn scan(width: u32, height: u32) -> ScanSource {
    let img = RgbImage::from_pixel(width, height, Rgb([250, 245, 230]));
    let mut buffer = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 75))
        .unwrap();
    ScanSource::from_bytes(buffer, "scan").unwrap()
}

fn record() -> BiblioRecord {
    BiblioRecord {
        part_id: 4242,
        item_id: 77,
        title: Some("Notes on frogs".into()),
        container_title: Some("Journal of Herpetology".into()),
        volume: Some("4".into()),
        issue: Some("2".into()),
        date: Some("c. 1911".into()),
        page_range: Some("1-2".into()),
        authors: vec![
            Author {
                name: "Doe, A.".into(),
                dates: None,
            },
            Author {
                name: "Roe, B.,".into(),
                dates: Some("1870-1950".into()),
            },
        ],
        ..Default::default()
    }
}

fn build(options: AssemblyOptions) -> Vec<u8> {
    let mut library = OcrLibrary::new();
    library.insert("frogs", OcrDocument::parse(OCR).unwrap());
    let record = record();
    let item = ItemRecord {
        sponsor: Some("Smithsonian Libraries".into()),
        ..Default::default()
    };
    let pages = (1..=2)
        .map(|sequence| SourcePage {
            page_id: 9000 + sequence as u64,
            ocr_source: "frogs".into(),
            sequence,
            scan: scan(600, 800),
        })
        .collect();
    assemble(
        ArticleInputs {
            record: &record,
            item: &item,
            ocr: &library,
            pages,
            logo: None,
        },
        FontSet::standard().unwrap(),
        options,
    )
    .unwrap()
}

#[test]
fn assembled_document_passes_audit() {
    let bytes = build(AssemblyOptions::default());
    let report = audit(&bytes, 2, true).unwrap();
    assert_eq!(report.page_count, 3);
    assert!(report.has_boilerplate, "cover text lacks boilerplate");
    assert!(report.passed());
}

#[test]
fn text_layer_is_extractable_and_properties_set() {
    let bytes = build(AssemblyOptions::default());
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.page_text(1).unwrap(), "Notes on frogs Plate");
    assert_eq!(reader.page_text(2).unwrap(), "Second page");

    let cover = reader.page_text(3).unwrap();
    assert!(cover.contains(BHL_BOILERPLATE));
    assert!(cover.contains("Doe, A. and Roe, B. 1911."));
    assert!(cover.contains("4(2), 1\u{2013}2."));

    assert_eq!(
        reader.info_string("Author").as_deref(),
        Some("Doe, A.; Roe, B., (1870-1950)")
    );
    assert_eq!(
        reader.info_string("Subject").as_deref(),
        Some("From the Biodiversity Heritage Library (BHL)")
    );
    assert!(reader.info_string("CreationDate").is_none());
}

#[test]
fn page_sizes_follow_the_plan() {
    let bytes = build(AssemblyOptions::default());
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    let layout = plan(
        &[PageImageSpec::new(600, 800)],
        1.0,
        Envelope::A4,
        SizingPolicy::PerPage,
    )
    .unwrap()[0];
    let (w, h) = reader.page_size_mm(1).unwrap();
    assert!((w - layout.width_mm).abs() < 0.01);
    assert!((h - layout.height_mm).abs() < 0.01);
    let (w, h) = reader.page_size_mm(3).unwrap();
    assert!((w - 210.0).abs() < 0.01 && (h - 297.0).abs() < 0.01);
}

#[test]
fn identical_inputs_give_identical_bytes() {
    let options = AssemblyOptions {
        layer: TextLayer::Visible,
        ..AssemblyOptions::default()
    };
    assert_eq!(build(options.clone()), build(options));
}

#[test]
fn without_cover_there_is_no_boilerplate() {
    let bytes = build(AssemblyOptions {
        include_cover: false,
        ..AssemblyOptions::default()
    });
    let report = audit(&bytes, 2, false).unwrap();
    assert!(report.page_count_matches());
    assert!(!report.has_boilerplate);
}

#[test]
fn resized_and_grey_build() {
    let bytes = build(AssemblyOptions {
        scale: 0.5,
        desaturate: true,
        policy: SizingPolicy::UniformDocument,
        compress: true,
        ..AssemblyOptions::default()
    });
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.page_count(), 3);
    assert_eq!(reader.page_text(2).unwrap(), "Second page");
}

fn fixture_fonts() -> FontSet {
    let ttf = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/Tuffy.ttf");
    FontSet::from_paths(&FontPaths {
        regular: ttf.clone(),
        bold: ttf.clone(),
        italic: ttf.clone(),
        bold_italic: ttf,
    })
    .unwrap()
}

fn build_unicode(fonts: FontSet) -> Vec<u8> {
    let mut library = OcrLibrary::new();
    library.insert("wiesen", OcrDocument::parse(UNICODE_OCR).unwrap());
    let record = BiblioRecord {
        part_id: 17,
        title: Some("\u{142}\u{105}ka".into()),
        ..Default::default()
    };
    let item = ItemRecord::default();
    assemble(
        ArticleInputs {
            record: &record,
            item: &item,
            ocr: &library,
            pages: vec![SourcePage {
                page_id: 1,
                ocr_source: "wiesen".into(),
                sequence: 1,
                scan: scan(600, 800),
            }],
            logo: None,
        },
        fonts,
        AssemblyOptions {
            include_cover: false,
            ..AssemblyOptions::default()
        },
    )
    .unwrap()
}

#[test]
fn unicode_ocr_text_survives_an_embedded_truetype_face() {
    let bytes = build_unicode(fixture_fonts());
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.page_text(1).unwrap(), UNICODE_LINE);
    assert_eq!(
        reader.info_string("Title").as_deref(),
        Some("\"\u{142}\u{105}ka.\" ")
    );
}

#[test]
fn unicode_ocr_text_survives_the_default_faces() {
    let bytes = build_unicode(FontSet::bundled().unwrap());
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.page_text(1).unwrap(), UNICODE_LINE);
}

#[test]
fn core_faces_fall_back_to_question_marks() {
    let bytes = build_unicode(FontSet::standard().unwrap());
    let reader = PdfReader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.page_text(1).unwrap(), "\u{dc}ber ??ka ???");
}

proptest! {
    #[test]
    fn justified_span_matches_target(
        width in 10.0f64..500.0,
        margin in 0.0f64..3.0,
        natural in 1.0f64..400.0,
        gaps in 1usize..30,
    ) {
        let plan = LinePlan::compute(width, margin, natural, gaps, Alignment::FullJustify);
        prop_assert!((plan.rendered_width() - (width - 2.0 * margin)).abs() < 1e-6);
        prop_assert_eq!(plan.dx, margin);
    }

    #[test]
    fn lone_words_never_stretch(width in 10.0f64..500.0, natural in 1.0f64..400.0) {
        let plan = LinePlan::compute(width, 1.0, natural, 0, Alignment::FullJustify);
        prop_assert!(!plan.stretches());
        prop_assert_eq!(plan.rendered_width(), natural);
    }
}
