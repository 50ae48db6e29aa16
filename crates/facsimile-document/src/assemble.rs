// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly: scanned pages with their OCR text layer, then the cover,
// then document properties.
//
// The assembly is a typestate. Pages can only be added while composing,
// adding the cover (or declining it) moves to `Covered`, and `finalize`
// consumes the assembly, so no page can be added to a finished document.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use facsimile_core::biblio::{BHL_SUBJECT, BiblioRecord, ItemRecord};
use facsimile_core::config::FacsimileConfig;
use facsimile_core::error::{FacsimileError, Result};
use facsimile_core::types::{Envelope, PageImageSpec, PageLayout, SizingPolicy, TextLayer};
use tracing::{debug, info, instrument};

use crate::cover::CoverPage;
use crate::image::{EmbeddedImage, ScanSource};
use crate::layout::plan;
use crate::ocr::OcrLibrary;
use crate::pdf::builder::{DocumentBuilder, DocumentInfo, Rgb, TextRenderMode};
use crate::pdf::font::{FontSet, FontStyle};
use crate::pdf::justify::{Alignment, CellOptions, CellRect, draw_with};

/// One scanned page in output order.
pub struct SourcePage {
    /// Library page identifier, for diagnostics.
    pub page_id: u64,
    /// Key of the OCR document holding this page's text.
    pub ocr_source: String,
    /// 1-based position of the page within its OCR document.
    pub sequence: usize,
    /// Decoded only while its page is composed.
    pub scan: ScanSource,
}

/// Knobs for one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub scale: f64,
    pub desaturate: bool,
    pub jpeg_quality: u8,
    pub policy: SizingPolicy,
    pub envelope: Envelope,
    pub font_size_pt: f64,
    pub inner_margin_mm: f64,
    pub layer: TextLayer,
    pub outline_lines: bool,
    pub include_cover: bool,
    pub compress: bool,
    /// Cover footer and CreationDate. `None` keeps output byte-stable.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self::from_config(&FacsimileConfig::default())
    }
}

impl AssemblyOptions {
    pub fn from_config(config: &FacsimileConfig) -> Self {
        Self {
            scale: config.image.resize,
            desaturate: config.image.desaturate,
            jpeg_quality: config.image.jpeg_quality,
            policy: config.layout.policy,
            envelope: config.layout.envelope,
            font_size_pt: config.text.font_size_pt,
            inner_margin_mm: config.text.inner_margin_mm,
            layer: config.text.layer,
            outline_lines: config.text.outline_lines,
            include_cover: config.cover.include,
            compress: config.pdf.compress,
            generated_at: None,
        }
    }

    pub fn generated_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.generated_at = at;
        self
    }
}

impl DocumentInfo {
    /// Document properties for an article.
    pub fn from_records(record: &BiblioRecord, generated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            title: record.citation(),
            author: record.author_metadata(),
            subject: BHL_SUBJECT.to_string(),
            creator: record.creator_url(),
            keywords: record.keywords(),
            producer: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            created: generated_at,
        }
    }
}

/// Accepting scanned pages.
pub struct Composing;
/// Cover placed (or declined); ready to finalize.
pub struct Covered;

/// A document under construction.
pub struct Assembly<'a, S> {
    builder: DocumentBuilder,
    ocr: &'a OcrLibrary,
    options: AssemblyOptions,
    pages: usize,
    lines: usize,
    state: PhantomData<S>,
}

impl<'a> Assembly<'a, Composing> {
    pub fn new(ocr: &'a OcrLibrary, fonts: FontSet, options: AssemblyOptions) -> Self {
        let mut builder = DocumentBuilder::new(fonts);
        builder.set_compression(options.compress);
        builder.set_cell_margin(options.inner_margin_mm);
        builder.set_margins(0.0, 0.0, 0.0);
        Self {
            builder,
            ocr,
            options,
            pages: 0,
            lines: 0,
            state: PhantomData,
        }
    }

    /// Compose one scanned page: the image on its planned canvas, then every
    /// OCR line fully justified into its box.
    #[instrument(skip_all, fields(page_id = page.page_id, source = %page.ocr_source, sequence = page.sequence))]
    pub fn add_page(&mut self, page: SourcePage, layout: &PageLayout) -> Result<()> {
        let ocr = self.ocr;
        let document = ocr.get(&page.ocr_source)?;
        let ocr_page = document
            .page_identifier_at_sequence(page.sequence)
            .ok_or_else(|| {
                FacsimileError::UnknownPage(format!(
                    "page {} has no OCR page at sequence {} of {}",
                    page.page_id, page.sequence, page.ocr_source
                ))
            })?;
        let lines = document.lines_for_page(ocr_page, self.options.scale, Some(layout.dpmm))?;

        let embedded = page.scan.decode()?.prepare(
            self.options.scale,
            self.options.desaturate,
            self.options.jpeg_quality,
        )?;

        self.builder.add_page(layout.width_mm, layout.height_mm)?;
        let handle = self.builder.add_image(&embedded);
        self.builder.place_image(
            handle,
            layout.offset_x_mm,
            layout.offset_y_mm,
            layout.image_width_mm,
            layout.image_height_mm,
        )?;

        self.builder
            .set_font(FontStyle::Regular, self.options.font_size_pt);
        self.builder.set_text_color(Rgb::BLACK);
        self.builder.set_underline(false);
        self.builder.set_render_mode(match self.options.layer {
            TextLayer::Invisible => TextRenderMode::Invisible,
            TextLayer::Visible => TextRenderMode::Fill,
        });

        let options = CellOptions {
            alignment: Alignment::FullJustify,
            outline: self.options.outline_lines,
            link: None,
        };
        for line in &lines {
            let rect = CellRect::new(
                layout.offset_x_mm + line.x,
                layout.offset_y_mm + line.y,
                line.w,
                line.h,
            );
            draw_with(&mut self.builder, rect, &line.text, options)?;
        }
        self.builder.set_render_mode(TextRenderMode::Fill);

        self.pages += 1;
        self.lines += lines.len();
        debug!(
            ocr_page,
            lines = lines.len(),
            dpmm = layout.dpmm,
            orientation = layout.orientation.tag(),
            "Page composed"
        );
        Ok(())
    }

    /// Scanned pages composed so far.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Append the cover page.
    pub fn add_cover(
        mut self,
        record: &BiblioRecord,
        item: &ItemRecord,
        logo: Option<&EmbeddedImage>,
    ) -> Result<Assembly<'a, Covered>> {
        CoverPage::new(record, item)
            .with_logo(logo)
            .generated_at(self.options.generated_at)
            .render(&mut self.builder)?;
        Ok(self.transition())
    }

    /// Finish without a cover page.
    pub fn without_cover(self) -> Assembly<'a, Covered> {
        self.transition()
    }

    fn transition(self) -> Assembly<'a, Covered> {
        Assembly {
            builder: self.builder,
            ocr: self.ocr,
            options: self.options,
            pages: self.pages,
            lines: self.lines,
            state: PhantomData,
        }
    }
}

impl Assembly<'_, Covered> {
    /// Write document properties and serialise. All or nothing.
    #[instrument(skip_all, fields(pages = self.pages, lines = self.lines))]
    pub fn finalize(self, record: &BiblioRecord) -> Result<Vec<u8>> {
        let info = DocumentInfo::from_records(record, self.options.generated_at);
        let bytes = self.builder.finish(&info)?;
        info!(bytes = bytes.len(), "Document finalized");
        Ok(bytes)
    }
}

/// Everything one article needs, already resolved.
pub struct ArticleInputs<'a> {
    pub record: &'a BiblioRecord,
    pub item: &'a ItemRecord,
    pub ocr: &'a OcrLibrary,
    pub pages: Vec<SourcePage>,
    pub logo: Option<EmbeddedImage>,
}

/// Plan, compose and finalize one article.
#[instrument(skip_all, fields(part_id = inputs.record.part_id, pages = inputs.pages.len()))]
pub fn assemble(inputs: ArticleInputs<'_>, fonts: FontSet, options: AssemblyOptions) -> Result<Vec<u8>> {
    let specs: Vec<PageImageSpec> = inputs.pages.iter().map(|p| p.scan.spec()).collect();
    let layouts = plan(&specs, options.scale, options.envelope, options.policy)?;
    let include_cover = options.include_cover;

    let mut assembly = Assembly::new(inputs.ocr, fonts, options);
    for (page, layout) in inputs.pages.into_iter().zip(&layouts) {
        assembly.add_page(page, layout)?;
    }

    let covered = if include_cover {
        assembly.add_cover(inputs.record, inputs.item, inputs.logo.as_ref())?
    } else {
        assembly.without_cover()
    };
    covered.finalize(inputs.record)
}
