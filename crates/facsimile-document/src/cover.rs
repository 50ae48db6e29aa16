// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The citation and rights page appended after the scanned pages.

use chrono::{DateTime, Utc};
use facsimile_core::biblio::{BHL_BASE_URL, BiblioRecord, ItemRecord, SegmentStyle};
use facsimile_core::error::Result;
use facsimile_core::types::Envelope;
use tracing::{debug, instrument};

use crate::image::EmbeddedImage;
use crate::pdf::builder::{DocumentBuilder, Rgb};
use crate::pdf::flow::write;
use crate::pdf::font::FontStyle;

const MARGIN_MM: f64 = 20.0;
const LOGO_X_MM: f64 = 30.0;
const LOGO_Y_MM: f64 = 30.0;
const LOGO_WIDTH_MM: f64 = 150.0;
const CITATION_Y_MM: f64 = 100.0;
const FOOTER_Y_MM: f64 = 270.0;

/// Everything printed on the cover page.
#[derive(Debug, Clone, Copy)]
pub struct CoverPage<'a> {
    pub record: &'a BiblioRecord,
    pub item: &'a ItemRecord,
    pub logo: Option<&'a EmbeddedImage>,
    /// Printed as "This file was generated ..." when set.
    pub generated_at: Option<DateTime<Utc>>,
}

impl<'a> CoverPage<'a> {
    pub fn new(record: &'a BiblioRecord, item: &'a ItemRecord) -> Self {
        Self {
            record,
            item,
            logo: None,
            generated_at: None,
        }
    }

    pub fn with_logo(mut self, logo: Option<&'a EmbeddedImage>) -> Self {
        self.logo = logo;
        self
    }

    pub fn generated_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.generated_at = at;
        self
    }

    /// Add the cover as a new A4 portrait page.
    #[instrument(skip_all, fields(part_id = self.record.part_id))]
    pub fn render(&self, builder: &mut DocumentBuilder) -> Result<()> {
        builder.set_margins(MARGIN_MM, MARGIN_MM, MARGIN_MM);
        builder.add_page(Envelope::A4.width_mm, Envelope::A4.height_mm)?;
        builder.set_underline(false);

        if let Some(logo) = self.logo {
            let height = LOGO_WIDTH_MM * f64::from(logo.height) / f64::from(logo.width);
            let handle = builder.add_image(logo);
            builder.place_image(handle, LOGO_X_MM, LOGO_Y_MM, LOGO_WIDTH_MM, height)?;
        }

        builder.set_y(CITATION_Y_MM);
        self.citation(builder)?;
        self.urls(builder)?;
        self.rights(builder)?;
        self.boilerplate(builder)?;

        if let Some(at) = self.generated_at {
            builder.set_y(FOOTER_Y_MM);
            plain(builder, Rgb::BLACK, FontStyle::Regular, 8.0);
            let stamp = at.format("%-d %B %Y at %H:%M UTC");
            write(builder, 5.0, &format!("This file was generated {stamp}"), None)?;
            builder.ln(5.0);
        }
        debug!("Cover page rendered");
        Ok(())
    }

    fn citation(&self, builder: &mut DocumentBuilder) -> Result<()> {
        const SIZE: f64 = 13.0;
        const LINE: f64 = 7.0;
        for segment in self.record.citation_segments() {
            match &segment.style {
                SegmentStyle::Regular => {
                    plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
                    write(builder, LINE, &segment.text, None)?;
                }
                SegmentStyle::Italic => {
                    plain(builder, Rgb::BLACK, FontStyle::Italic, SIZE);
                    write(builder, LINE, &segment.text, None)?;
                }
                SegmentStyle::Link(url) => link(builder, SIZE, LINE, &segment.text, url)?,
            }
        }
        plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
        builder.ln(LINE);
        builder.ln(LINE);
        Ok(())
    }

    fn urls(&self, builder: &mut DocumentBuilder) -> Result<()> {
        const SIZE: f64 = 11.0;
        const LINE: f64 = 6.0;
        let mut rows = vec![("View This Item Online: ", self.record.item_url())];
        if let Some(doi) = self.record.doi_url() {
            rows.push(("DOI: ", doi));
        }
        rows.push(("Permalink: ", self.record.permalink()));

        for (label, url) in rows {
            plain(builder, Rgb::BLACK, FontStyle::Bold, SIZE);
            write(builder, LINE, label, None)?;
            link(builder, SIZE, LINE, &url, &url)?;
            builder.ln(LINE);
        }
        builder.ln(LINE);
        Ok(())
    }

    fn rights(&self, builder: &mut DocumentBuilder) -> Result<()> {
        const SIZE: f64 = 11.0;
        const LINE: f64 = 6.0;
        let blocks = [
            ("Holding Institution ", self.item.holding_institution.as_deref()),
            ("Sponsored by ", self.item.sponsor.as_deref()),
        ];
        for (heading, body) in blocks {
            let Some(body) = body.filter(|b| !b.is_empty()) else {
                continue;
            };
            plain(builder, Rgb::BLACK, FontStyle::Bold, SIZE);
            write(builder, LINE, heading, None)?;
            builder.ln(LINE);
            plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
            write(builder, LINE, body, None)?;
            builder.ln(LINE);
            builder.ln(LINE);
        }

        plain(builder, Rgb::BLACK, FontStyle::Bold, SIZE);
        write(builder, LINE, "Copyright & Reuse ", None)?;
        builder.ln(LINE);
        plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
        let status = self.record.rights_status.as_deref().unwrap_or_default();
        write(builder, LINE, &format!("Copyright Status: {status}"), None)?;
        builder.ln(LINE);

        if let Some(holder) = self.item.rights_holder.as_deref().filter(|h| !h.is_empty()) {
            plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
            write(builder, LINE, &format!("Rights Holder: {holder}"), None)?;
            builder.ln(LINE);
        }
        let license = self
            .record
            .license_url
            .as_deref()
            .or(self.item.license_url.as_deref())
            .filter(|l| !l.is_empty());
        if let Some(license) = license {
            plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
            write(builder, LINE, "License: ", None)?;
            link(builder, SIZE, LINE, license, license)?;
            builder.ln(LINE);
        }
        if let Some(rights) = self.item.rights.as_deref().filter(|r| !r.is_empty()) {
            plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
            write(builder, LINE, "Rights: ", None)?;
            link(builder, SIZE, LINE, rights, rights)?;
            builder.ln(LINE);
        }
        builder.ln(LINE);
        Ok(())
    }

    fn boilerplate(&self, builder: &mut DocumentBuilder) -> Result<()> {
        const SIZE: f64 = 11.0;
        const LINE: f64 = 5.0;
        builder.ln(LINE);
        plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
        write(builder, LINE, "This document was created from content at the ", None)?;
        plain(builder, Rgb::BLACK, FontStyle::Bold, SIZE);
        write(builder, LINE, "Biodiversity Heritage Library", None)?;
        plain(builder, Rgb::BLACK, FontStyle::Regular, SIZE);
        write(
            builder,
            LINE,
            ", the world's largest open access digital library for biodiversity literature and archives. ",
            None,
        )?;
        write(builder, LINE, "Visit BHL at ", None)?;
        builder.set_text_color(Rgb::LINK_BLUE);
        write(builder, LINE, BHL_BASE_URL, Some(BHL_BASE_URL))?;
        builder.set_text_color(Rgb::BLACK);
        write(builder, LINE, ".", None)
    }
}

fn plain(builder: &mut DocumentBuilder, color: Rgb, style: FontStyle, size: f64) {
    builder.set_font(style, size);
    builder.set_underline(false);
    builder.set_text_color(color);
}

/// Blue underlined text with a URI annotation; restores plain black after.
fn link(builder: &mut DocumentBuilder, size: f64, line: f64, text: &str, url: &str) -> Result<()> {
    builder.set_font(FontStyle::Regular, size);
    builder.set_underline(true);
    builder.set_text_color(Rgb::LINK_BLUE);
    write(builder, line, text, Some(url))?;
    plain(builder, Rgb::BLACK, FontStyle::Regular, size);
    Ok(())
}
