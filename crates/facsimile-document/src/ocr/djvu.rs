// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DjVu XML reader. Streams `BODY/OBJECT` pages with their `PARAM`s and the
// `HIDDENTEXT` column/region/paragraph/line/word hierarchy into an
// `OcrDocument`.

use std::path::Path;

use facsimile_core::error::{FacsimileError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, info, instrument, warn};

use super::model::{BoundingBox, OcrDocument, OcrLine, OcrPage, OcrWord};

/// Resolution assumed when a page carries no usable `DPI` parameter.
pub const DEFAULT_DPI: f64 = 300.0;

impl OcrDocument {
    /// Read and parse an OCR file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|err| {
            FacsimileError::MalformedSource(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::parse(&xml)
    }

    /// Parse DjVu XML.
    ///
    /// Only a missing `BODY` or broken XML is fatal. Pages without text
    /// regions come back with zero lines.
    #[instrument(skip_all, fields(xml_len = xml.len()))]
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut state = ParseState::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    state.open(&e)?;
                    state.stack.push(e.name().as_ref().to_vec());
                }
                Ok(Event::Empty(e)) => {
                    state.open(&e)?;
                    state.close(e.name().as_ref());
                }
                Ok(Event::Text(t)) => {
                    if let Some(word) = state.word.as_mut() {
                        let text = t.unescape().map_err(|err| {
                            FacsimileError::MalformedSource(format!("bad word text: {err}"))
                        })?;
                        word.text.push_str(&text);
                    }
                }
                Ok(Event::End(e)) => {
                    state.stack.pop();
                    state.close(e.name().as_ref());
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(FacsimileError::MalformedSource(format!(
                        "XML error at byte {}: {}",
                        reader.buffer_position(),
                        err
                    )));
                }
                _ => {}
            }
        }

        if !state.saw_body {
            return Err(FacsimileError::MalformedSource(
                "no BODY element in OCR source".into(),
            ));
        }

        info!(pages = state.pages.len(), "OCR source parsed");
        Ok(OcrDocument::from_pages(state.pages))
    }
}

#[derive(Default)]
struct PendingPage {
    name: Option<String>,
    dpi: Option<String>,
    lines: Vec<OcrLine>,
}

struct PendingWord {
    bbox: Option<BoundingBox>,
    text: String,
}

#[derive(Default)]
struct ParseState {
    stack: Vec<Vec<u8>>,
    saw_body: bool,
    pages: Vec<OcrPage>,
    page: Option<PendingPage>,
    line: Option<Vec<OcrWord>>,
    word: Option<PendingWord>,
}

impl ParseState {
    fn inside(&self, name: &[u8]) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match e.name().as_ref() {
            b"BODY" => self.saw_body = true,
            b"OBJECT" if self.inside(b"BODY") => self.page = Some(PendingPage::default()),
            b"PARAM" => {
                if let Some(page) = self.page.as_mut() {
                    let name = attribute(e, b"name")?;
                    let value = attribute(e, b"value")?;
                    match name.as_deref() {
                        Some("PAGE") => page.name = value,
                        Some("DPI") => page.dpi = value,
                        _ => {}
                    }
                }
            }
            b"LINE" if self.page.is_some() && self.inside(b"HIDDENTEXT") => {
                self.line = Some(Vec::new());
            }
            b"WORD" if self.line.is_some() => {
                let coords = attribute(e, b"coords")?;
                let bbox = coords.as_deref().and_then(parse_coords);
                if bbox.is_none() {
                    warn!(coords = ?coords, "Skipping word with unusable coordinates");
                }
                self.word = Some(PendingWord {
                    bbox,
                    text: String::new(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"WORD" => {
                if let (Some(word), Some(line)) = (self.word.take(), self.line.as_mut())
                    && let Some(bbox) = word.bbox
                {
                    let text = word.text.trim();
                    if !text.is_empty() {
                        line.push(OcrWord {
                            text: text.to_string(),
                            bbox,
                        });
                    }
                }
            }
            b"LINE" => {
                if let (Some(words), Some(page)) = (self.line.take(), self.page.as_mut())
                    && let Some(line) = OcrLine::from_words(words)
                {
                    page.lines.push(line);
                }
            }
            b"OBJECT" => {
                if let Some(page) = self.page.take() {
                    let sequence = self.pages.len() + 1;
                    self.pages.push(finish_page(page, sequence));
                }
            }
            _ => {}
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|err| {
                FacsimileError::MalformedSource(format!("bad attribute value: {err}"))
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn finish_page(page: PendingPage, sequence: usize) -> OcrPage {
    let id = match page.name.as_deref() {
        Some(name) if !name.is_empty() => page_stem(name).to_string(),
        _ => {
            warn!(sequence, "Page has no PAGE parameter");
            format!("page-{sequence:04}")
        }
    };
    let dpi = match page.dpi.as_deref().map(|d| d.trim().parse::<f64>()) {
        Some(Ok(dpi)) if dpi > 0.0 => dpi,
        other => {
            warn!(page_id = %id, dpi = ?other, "Missing or invalid DPI, assuming {DEFAULT_DPI}");
            DEFAULT_DPI
        }
    };
    debug!(page_id = %id, dpi, lines = page.lines.len(), sequence, "Page parsed");
    OcrPage {
        id,
        dpi,
        sequence,
        lines: page.lines,
    }
}

/// Parse a `coords` attribute. Field order is `x1,y2,x2,y1[,unused]`.
pub fn parse_coords(raw: &str) -> Option<BoundingBox> {
    let fields: Vec<f64> = raw
        .split(',')
        .take(4)
        .map(|f| f.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match fields.as_slice() {
        [x1, y2, x2, y1] => Some(BoundingBox::new(*x1, *y1, *x2, *y2)),
        _ => None,
    }
}

/// Strip a trailing extension of three or four characters.
pub fn page_stem(name: &str) -> &str {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let n = chars.len();
    for tail in [4usize, 3] {
        if n > tail {
            let (idx, c) = chars[n - tail - 1];
            if c == '.' {
                return &name[..idx];
            }
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DjVuXML>
  <HEAD></HEAD>
  <BODY>
    <OBJECT data="file://localhost/x" type="image/x.djvu" usemap="a_0001.djvu">
      <PARAM name="PAGE" value="a_0001.djvu"/>
      <PARAM name="DPI" value="400"/>
      <HIDDENTEXT>
        <PAGECOLUMN>
          <REGION>
            <PARAGRAPH>
              <LINE>
                <WORD coords="100,250,300,50,0">Quick</WORD>
                <WORD coords="320,260,400,40,0">fox &amp; hound</WORD>
              </LINE>
              <LINE></LINE>
            </PARAGRAPH>
          </REGION>
          <REGION>
            <PARAGRAPH>
              <LINE><WORD coords="10,20,30,5">second</WORD></LINE>
            </PARAGRAPH>
          </REGION>
        </PAGECOLUMN>
      </HIDDENTEXT>
    </OBJECT>
    <OBJECT data="file://localhost/y" type="image/x.djvu">
      <PARAM name="PAGE" value="a_0002.jp2"/>
      <HIDDENTEXT/>
    </OBJECT>
  </BODY>
</DjVuXML>"#;

    #[test]
    fn coordinate_field_order() {
        let bbox = parse_coords("100,250,300,50,0").unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                x1: 100.0,
                y1: 50.0,
                x2: 300.0,
                y2: 250.0
            }
        );
    }

    #[test]
    fn short_or_garbage_coords_are_rejected() {
        assert!(parse_coords("1,2,3").is_none());
        assert!(parse_coords("1,two,3,4,0").is_none());
    }

    #[test]
    fn page_stem_strips_extension() {
        assert_eq!(page_stem("abc_0001.djvu"), "abc_0001");
        assert_eq!(page_stem("abc_0001.jp2"), "abc_0001");
        assert_eq!(page_stem("abc_0001"), "abc_0001");
        assert_eq!(page_stem("abc.d"), "abc.d");
    }

    #[test]
    fn parses_pages_lines_and_words() {
        let doc = OcrDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.page_count(), 2);

        let first = doc.page("a_0001").unwrap();
        assert_eq!(first.dpi, 400.0);
        assert_eq!(first.sequence, 1);
        // The empty LINE is dropped; both REGIONs are read.
        assert_eq!(first.lines.len(), 2);
        assert_eq!(first.lines[0].text(), "Quick fox & hound");
        assert_eq!(first.lines[0].bbox(), BoundingBox::new(100.0, 40.0, 400.0, 260.0));
        assert_eq!(first.lines[1].text(), "second");

        let second = doc.page("a_0002").unwrap();
        assert_eq!(second.dpi, DEFAULT_DPI);
        assert!(second.lines.is_empty());
        assert_eq!(doc.page_identifier_at_sequence(2), Some("a_0002"));
    }

    #[test]
    fn missing_body_is_malformed() {
        let err = OcrDocument::parse("<DjVuXML><HEAD/></DjVuXML>").unwrap_err();
        assert!(matches!(err, FacsimileError::MalformedSource(_)));
    }

    #[test]
    fn broken_xml_is_malformed() {
        let err = OcrDocument::parse("<DjVuXML><BODY><OBJECT></BODY>").unwrap_err();
        assert!(matches!(err, FacsimileError::MalformedSource(_)));
    }

    #[test]
    fn empty_body_yields_no_pages() {
        let doc = OcrDocument::parse("<DjVuXML><BODY/></DjVuXML>").unwrap();
        assert_eq!(doc.page_count(), 0);
    }

    fn xml_for_line(boxes: &[(u32, u32, u32, u32)]) -> String {
        let words: String = boxes
            .iter()
            .enumerate()
            .map(|(i, (x1, y1, x2, y2))| {
                format!(r#"<WORD coords="{x1},{y2},{x2},{y1},0">w{i}</WORD>"#)
            })
            .collect();
        format!(
            r#"<DjVuXML><BODY><OBJECT><PARAM name="PAGE" value="p.djvu"/><PARAM name="DPI" value="300"/>
            <HIDDENTEXT><PAGECOLUMN><REGION><PARAGRAPH><LINE>{words}</LINE></PARAGRAPH></REGION></PAGECOLUMN></HIDDENTEXT>
            </OBJECT></BODY></DjVuXML>"#
        )
    }

    proptest! {
        #[test]
        fn line_box_is_word_envelope(
            raw in prop::collection::vec((0u32..5000, 0u32..5000, 0u32..400, 0u32..200), 1..12)
        ) {
            let boxes: Vec<(u32, u32, u32, u32)> = raw
                .iter()
                .map(|(x, y, w, h)| (*x, *y, x + w, y + h))
                .collect();
            let doc = OcrDocument::parse(&xml_for_line(&boxes)).unwrap();
            let line = &doc.page("p").unwrap().lines[0];

            let bbox = line.bbox();
            prop_assert_eq!(bbox.x1, boxes.iter().map(|b| b.0).min().unwrap() as f64);
            prop_assert_eq!(bbox.y1, boxes.iter().map(|b| b.1).min().unwrap() as f64);
            prop_assert_eq!(bbox.x2, boxes.iter().map(|b| b.2).max().unwrap() as f64);
            prop_assert_eq!(bbox.y2, boxes.iter().map(|b| b.3).max().unwrap() as f64);
            prop_assert_eq!(line.words().len(), boxes.len());
        }
    }
}
