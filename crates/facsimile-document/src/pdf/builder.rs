// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page builder on top of `printpdf` 0.8.
//
// Coordinates are millimetres from the top-left corner of the current page;
// they are converted to PDF points (bottom-left origin) as `Op`s are
// recorded. `printpdf` serialises the pages and subsets embedded fonts; a
// short `lopdf` pass then sets the catalog and info entries it does not
// expose and drops its random file identifier so output is byte-stable.

use chrono::{DateTime, Utc};
use facsimile_core::error::{FacsimileError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use printpdf::{
    Actions, BorderArray, Color, DictItem, ExternalStream, ExternalXObject, FontId, LinkAnnotation,
    Mm, Op, PaintMode, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, Px, TextItem,
    TextRenderingMode, XObject, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::font::{FontSet, FontStyle, Program, TextEncoding, Typeface};
use crate::image::EmbeddedImage;

/// Points per millimetre.
pub fn points_per_mm() -> f64 {
    f64::from(Mm(1.0).into_pt().0)
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const LINK_BLUE: Rgb = Rgb(76, 103, 155);

    pub(crate) fn to_color(self) -> Color {
        let unit = |c: u8| f32::from(c) / 255.0;
        Color::Rgb(printpdf::Rgb::new(unit(self.0), unit(self.1), unit(self.2), None))
    }
}

/// PDF text rendering mode (`Tr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRenderMode {
    Fill,
    /// Neither filled nor stroked: selectable and searchable only.
    Invisible,
}

impl TextRenderMode {
    fn to_pdf(self) -> TextRenderingMode {
        match self {
            TextRenderMode::Fill => TextRenderingMode::Fill,
            TextRenderMode::Invisible => TextRenderingMode::Invisible,
        }
    }
}

/// Handle to an image XObject registered with the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle(usize);

/// Document information dictionary contents.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub keywords: Vec<String>,
    pub producer: String,
    /// Omitted when `None`, keeping output byte-stable.
    pub created: Option<DateTime<Utc>>,
}

fn pt(v: f64) -> Pt {
    Pt(v as f32)
}

fn pdf_error(context: &'static str) -> impl Fn(lopdf::Error) -> FacsimileError {
    move |err| FacsimileError::Pdf(format!("{context}: {err}"))
}

struct PageCanvas {
    width_mm: f64,
    height_mm: f64,
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    style: FontStyle,
    size_pt: f64,
    color: Rgb,
    underline: bool,
    render_mode: TextRenderMode,
}

/// Incrementally builds a PDF document page by page.
pub struct DocumentBuilder {
    fonts: FontSet,
    font_ids: Vec<FontId>,
    images: Vec<XObject>,
    pages: Vec<PdfPage>,
    page: Option<PageCanvas>,
    text: TextState,
    x: f64,
    y: f64,
    left_margin: f64,
    top_margin: f64,
    right_margin: f64,
    cell_margin: f64,
    compress: bool,
    replaced_chars: usize,
    k: f64,
}

impl DocumentBuilder {
    // -- Construction ---------------------------------------------------------

    pub fn new(fonts: FontSet) -> Self {
        // Resource names double as BaseFont names, so use the faces' own,
        // suffixed where two styles share one.
        let mut font_ids: Vec<FontId> = Vec::with_capacity(4);
        for style in FontStyle::ALL {
            let name = fonts.get(style).name();
            let mut id = name.to_string();
            let mut n = 2;
            while font_ids.iter().any(|f| f.0 == id) {
                id = format!("{name}-{n}");
                n += 1;
            }
            font_ids.push(FontId(id));
        }

        Self {
            fonts,
            font_ids,
            images: Vec::new(),
            pages: Vec::new(),
            page: None,
            text: TextState {
                style: FontStyle::Regular,
                size_pt: 10.0,
                color: Rgb::BLACK,
                underline: false,
                render_mode: TextRenderMode::Fill,
            },
            x: 0.0,
            y: 0.0,
            left_margin: 0.0,
            top_margin: 0.0,
            right_margin: 0.0,
            cell_margin: 1.0,
            compress: false,
            replaced_chars: 0,
            k: points_per_mm(),
        }
    }

    /// Deflate streams when finishing.
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    // -- Pages ----------------------------------------------------------------

    /// Start a new page, closing the current one. The cursor moves to the top
    /// left margin corner.
    pub fn add_page(&mut self, width_mm: f64, height_mm: f64) -> Result<()> {
        if !(width_mm > 0.0 && height_mm > 0.0) {
            return Err(FacsimileError::DegenerateGeometry(format!(
                "page size {width_mm}x{height_mm} mm"
            )));
        }
        self.close_page();
        self.page = Some(PageCanvas {
            width_mm,
            height_mm,
            ops: Vec::new(),
        });
        self.x = self.left_margin;
        self.y = self.top_margin;
        Ok(())
    }

    /// Pages started so far, including the open one.
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.page.is_some())
    }

    /// Size of the open page.
    pub fn page_size(&self) -> Option<(f64, f64)> {
        self.page.as_ref().map(|p| (p.width_mm, p.height_mm))
    }

    fn canvas(&mut self) -> Result<&mut PageCanvas> {
        self.page
            .as_mut()
            .ok_or_else(|| FacsimileError::Pdf("no page has been started".into()))
    }

    fn close_page(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        self.pages.push(PdfPage::new(
            Mm(page.width_mm as f32),
            Mm(page.height_mm as f32),
            page.ops,
        ));
        debug!(page = self.pages.len(), "Page closed");
    }

    // -- Cursor and margins ---------------------------------------------------

    pub fn set_margins(&mut self, left: f64, top: f64, right: f64) {
        self.left_margin = left;
        self.top_margin = top;
        self.right_margin = right;
    }

    pub fn left_margin(&self) -> f64 {
        self.left_margin
    }

    pub fn right_margin(&self) -> f64 {
        self.right_margin
    }

    /// Inner padding applied inside text cells.
    pub fn cell_margin(&self) -> f64 {
        self.cell_margin
    }

    pub fn set_cell_margin(&mut self, margin_mm: f64) {
        self.cell_margin = margin_mm;
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Move to a new vertical position at the left margin.
    pub fn set_y(&mut self, y: f64) {
        self.x = self.left_margin;
        self.y = y;
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Line break: back to the left margin, down by `h`.
    pub fn ln(&mut self, h: f64) {
        self.x = self.left_margin;
        self.y += h;
    }

    // -- Text state -----------------------------------------------------------

    pub fn set_font(&mut self, style: FontStyle, size_pt: f64) {
        self.text.style = style;
        self.text.size_pt = size_pt;
    }

    pub fn font_style(&self) -> FontStyle {
        self.text.style
    }

    pub fn font_size_pt(&self) -> f64 {
        self.text.size_pt
    }

    /// Font size in millimetres.
    pub fn font_size(&self) -> f64 {
        self.text.size_pt / self.k
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text.color = color;
    }

    pub fn text_color(&self) -> Rgb {
        self.text.color
    }

    pub fn set_underline(&mut self, underline: bool) {
        self.text.underline = underline;
    }

    pub fn underline(&self) -> bool {
        self.text.underline
    }

    pub fn set_render_mode(&mut self, mode: TextRenderMode) {
        self.text.render_mode = mode;
    }

    pub fn font(&self) -> &Typeface {
        self.fonts.get(self.text.style)
    }

    pub fn text_encoding(&self) -> TextEncoding {
        self.font().encoding()
    }

    /// Advance width of `text` in millimetres at the current font and size.
    pub fn string_width(&self, text: &str) -> f64 {
        self.font().text_width(text) * self.font_size() / 1000.0
    }

    /// Characters replaced so far because the selected face had no glyph.
    pub fn replaced_chars(&self) -> usize {
        self.replaced_chars
    }

    // -- Text operations ----------------------------------------------------------

    pub(crate) fn render_mode_op(&self) -> Op {
        Op::SetTextRenderingMode {
            mode: self.text.render_mode.to_pdf(),
        }
    }

    pub(crate) fn fill_color_op(&self) -> Op {
        Op::SetFillColor {
            col: self.text.color.to_color(),
        }
    }

    /// `Tf` selecting the current face and size.
    pub(crate) fn select_font(&self) -> Op {
        let size = pt(self.text.size_pt);
        match self.font().program() {
            Program::Core(font) => Op::SetFontSizeBuiltinFont { size, font: *font },
            Program::Embedded(_) => Op::SetFontSize {
                size,
                font: self.font_ids[self.text.style.index()].clone(),
            },
        }
    }

    /// Text run for the current face. Characters it cannot show are replaced
    /// and counted.
    pub(crate) fn text_item(&mut self, text: &str) -> TextItem {
        let (shown, replaced) = self.font().sanitize(text);
        let shown = shown.into_owned();
        self.replaced_chars += replaced;
        TextItem::Text(shown)
    }

    /// Show-text operation in the current face.
    pub(crate) fn show(&self, items: Vec<TextItem>) -> Op {
        match self.font().program() {
            Program::Core(font) => Op::WriteTextBuiltinFont { items, font: *font },
            Program::Embedded(_) => Op::WriteText {
                items,
                font: self.font_ids[self.text.style.index()].clone(),
            },
        }
    }

    // -- Drawing --------------------------------------------------------------

    pub(crate) fn push(&mut self, op: Op) -> Result<()> {
        self.canvas()?.ops.push(op);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn operations(&self) -> &[Op] {
        self.page.as_ref().map(|p| p.ops.as_slice()).unwrap_or(&[])
    }

    #[cfg(test)]
    pub(crate) fn annotation_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, Op::LinkAnnotation { .. }))
            .count()
    }

    /// Convert a top-left-origin millimetre y coordinate to PDF points.
    pub fn pdf_y(&self, y_mm: f64) -> f64 {
        let height = self.page.as_ref().map(|p| p.height_mm).unwrap_or(0.0);
        (height - y_mm) * self.k
    }

    /// Scale factor from millimetres to points.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Rectangle `(x, y, w, h)` in points with its top edge at `y`, as
    /// `printpdf` expects for paths.
    pub(crate) fn path_rect(&self, x: f64, y: f64, w: f64, h: f64) -> printpdf::Rect {
        printpdf::Rect {
            x: pt(x * self.k),
            y: pt(self.pdf_y(y)),
            width: pt(w * self.k),
            height: pt(h * self.k),
        }
    }

    /// Stroke a rectangle outline.
    pub fn outline(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let mut polygon = self.path_rect(x, y, w, h).to_polygon();
        polygon.mode = PaintMode::Stroke;
        self.push(Op::DrawPolygon { polygon })
    }

    /// Register an image XObject for later placement.
    pub fn add_image(&mut self, image: &EmbeddedImage) -> ImageHandle {
        let name = |n: &[u8]| DictItem::Name(n.to_vec());
        let mut dict = std::collections::BTreeMap::new();
        dict.insert("Type".to_string(), name(b"XObject"));
        dict.insert("Subtype".to_string(), name(b"Image"));
        dict.insert("Width".to_string(), DictItem::Int(i64::from(image.width)));
        dict.insert("Height".to_string(), DictItem::Int(i64::from(image.height)));
        dict.insert("ColorSpace".to_string(), name(image.color_space.pdf_name()));
        dict.insert("BitsPerComponent".to_string(), DictItem::Int(8));
        if image.dct {
            dict.insert("Filter".to_string(), name(b"DCTDecode"));
        }
        self.images.push(XObject::External(ExternalXObject {
            stream: ExternalStream {
                dict,
                content: image.data.clone(),
                compress: !image.dct,
            },
            width: Some(Px(image.width as usize)),
            height: Some(Px(image.height as usize)),
            dpi: None,
        }));
        ImageHandle(self.images.len() - 1)
    }

    /// Paint a registered image into the box `(x, y, w, h)`.
    pub fn place_image(&mut self, image: ImageHandle, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let (px_w, px_h) = match self.images.get(image.0) {
            Some(XObject::External(ext)) => (
                ext.width.map(|p| p.0).unwrap_or(1),
                ext.height.map(|p| p.0).unwrap_or(1),
            ),
            _ => return Err(FacsimileError::Pdf(format!("unknown image {}", image.0))),
        };
        let k = self.k;
        // At 72 dpi one pixel maps to one point; the scale takes it from there.
        let transform = XObjectTransform {
            translate_x: Some(pt(x * k)),
            translate_y: Some(pt(self.pdf_y(y + h))),
            rotate: None,
            scale_x: Some((w * k / px_w as f64) as f32),
            scale_y: Some((h * k / px_h as f64) as f32),
            dpi: Some(72.0),
        };
        self.push(Op::UseXobject {
            id: image_resource_id(image),
            transform,
        })
    }

    /// Clickable URI annotation over the box `(x, y, w, h)`.
    pub fn add_link(&mut self, x: f64, y: f64, w: f64, h: f64, url: &str) -> Result<()> {
        let k = self.k;
        let rect = printpdf::Rect {
            x: pt(x * k),
            y: pt(self.pdf_y(y + h)),
            width: pt(w * k),
            height: pt(h * k),
        };
        let link = LinkAnnotation::new(
            rect,
            Actions::Uri(url.to_string()),
            Some(BorderArray::Solid([0.0, 0.0, 0.0])),
            None,
            None,
        );
        self.push(Op::LinkAnnotation { link })
    }

    // -- Finalisation -----------------------------------------------------------

    /// Serialise through `printpdf`, then set the catalog and info entries.
    #[instrument(skip_all, fields(title = %info.title))]
    pub fn finish(mut self, info: &DocumentInfo) -> Result<Vec<u8>> {
        self.close_page();
        if self.pages.is_empty() {
            return Err(FacsimileError::Pdf("document has no pages".into()));
        }
        let page_count = self.pages.len();
        let image_count = self.images.len();

        let mut doc = PdfDocument::new(&info.title);
        for (face, id) in self.fonts.into_faces().into_iter().zip(self.font_ids) {
            if let Program::Embedded(parsed) = face.into_program() {
                doc.resources.fonts.map.insert(id, *parsed);
            }
        }
        for (index, image) in self.images.into_iter().enumerate() {
            doc.resources
                .xobjects
                .map
                .insert(image_resource_id(ImageHandle(index)), image);
        }
        doc.with_pages(self.pages);

        let options = PdfSaveOptions {
            subset_fonts: true,
            image_optimization: None,
            ..PdfSaveOptions::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let raw = doc.save(&options, &mut warnings);
        debug!(bytes = raw.len(), warnings = warnings.len(), "printpdf pass complete");

        if self.replaced_chars > 0 {
            warn!(
                count = self.replaced_chars,
                "Characters without a glyph in the selected fonts were shown as '?'"
            );
        }

        let output = finalise(&raw, info, self.compress)?;
        info!(
            pages = page_count,
            images = image_count,
            bytes = output.len(),
            "PDF serialised"
        );
        Ok(output)
    }
}

fn image_resource_id(image: ImageHandle) -> XObjectId {
    XObjectId(format!("Im{}", image.0 + 1))
}

fn info_dictionary(info: &DocumentInfo) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Title", lopdf::text_string(&info.title));
    dict.set("Author", lopdf::text_string(&info.author));
    dict.set("Subject", lopdf::text_string(&info.subject));
    dict.set("Creator", lopdf::text_string(&info.creator));
    if !info.keywords.is_empty() {
        dict.set("Keywords", lopdf::text_string(&info.keywords.join(", ")));
    }
    dict.set("Producer", lopdf::text_string(&info.producer));
    if let Some(created) = info.created {
        dict.set(
            "CreationDate",
            Object::string_literal(created.format("D:%Y%m%d%H%M%SZ").to_string()),
        );
    }
    dict
}

/// Catalog layout and open action, our info dictionary, annotations on the
/// page objects, and no random trailer identifier.
fn finalise(raw: &[u8], info: &DocumentInfo, compress: bool) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(raw).map_err(pdf_error("failed to reload PDF"))?;
    doc.version = "1.5".to_string();

    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let first_page = *pages
        .first()
        .ok_or_else(|| FacsimileError::Pdf("serialised document has no pages".into()))?;
    for page in &pages {
        hoist_annotations(&mut doc, *page)?;
    }

    let root = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(pdf_error("missing catalog"))?;
    let catalog = doc
        .get_dictionary_mut(root)
        .map_err(pdf_error("unreadable catalog"))?;
    catalog.set("PageLayout", Object::Name(b"TwoColumnLeft".to_vec()));
    catalog.set(
        "OpenAction",
        Object::Array(vec![
            Object::Reference(first_page),
            Object::Name(b"Fit".to_vec()),
        ]),
    );

    let info_dict = Object::Dictionary(info_dictionary(info));
    match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => {
            doc.objects.insert(id, info_dict);
        }
        Err(_) => {
            let id = doc.add_object(info_dict);
            doc.trailer.set("Info", Object::Reference(id));
        }
    }
    doc.trailer.remove(b"ID");
    doc.prune_objects();

    if compress {
        doc.compress();
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| FacsimileError::Pdf(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}

/// `printpdf` files link annotations under the page resources; viewers only
/// look for them on the page.
fn hoist_annotations(doc: &mut Document, page: ObjectId) -> Result<()> {
    let resources = doc
        .get_dictionary(page)
        .and_then(|dict| dict.get(b"Resources"))
        .and_then(Object::as_reference);
    let Ok(resources) = resources else {
        return Ok(());
    };
    let annots = doc
        .get_dictionary_mut(resources)
        .ok()
        .and_then(|dict| dict.remove(b"Annots"));
    if let Some(Object::Array(items)) = annots
        && !items.is_empty()
    {
        doc.get_dictionary_mut(page)
            .map_err(pdf_error("unreadable page"))?
            .set("Annots", Object::Array(items));
    }
    Ok(())
}
