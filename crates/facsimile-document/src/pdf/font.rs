// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fonts for generated text: the PDF core Helvetica family (single-byte
// WinAnsi) and embedded TrueType faces (two-byte Identity-H, subset by
// `printpdf` on save). DejaVu Sans ships with the crate and is the default.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use facsimile_core::config::{FontPaths, FontSource};
use facsimile_core::error::{FacsimileError, Result};
use printpdf::{BuiltinFont, ParsedFont, PdfWarnMsg};
use tracing::{debug, info, instrument};
use ttf_parser::Face;

/// Shown in place of characters a face has no glyph for.
pub const REPLACEMENT: char = '?';

const BUNDLED: [(&str, &[u8]); 4] = [
    ("DejaVuSans", include_bytes!("../../fonts/DejaVuSans.ttf")),
    ("DejaVuSans-Bold", include_bytes!("../../fonts/DejaVuSans-Bold.ttf")),
    ("DejaVuSans-Oblique", include_bytes!("../../fonts/DejaVuSans-Oblique.ttf")),
    (
        "DejaVuSans-BoldOblique",
        include_bytes!("../../fonts/DejaVuSans-BoldOblique.ttf"),
    ),
];

/// How a face encodes text in show-text operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// One byte per character; the `Tw` word-spacing operator applies.
    Narrow,
    /// Two-byte glyph ids; `Tw` has no effect.
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            FontStyle::Regular => 0,
            FontStyle::Bold => 1,
            FontStyle::Italic => 2,
            FontStyle::BoldItalic => 3,
        }
    }

    fn helvetica(self) -> BuiltinFont {
        match self {
            FontStyle::Regular => BuiltinFont::Helvetica,
            FontStyle::Bold => BuiltinFont::HelveticaBold,
            FontStyle::Italic => BuiltinFont::HelveticaOblique,
            FontStyle::BoldItalic => BuiltinFont::HelveticaBoldOblique,
        }
    }
}

/// Where the glyphs come from when the page is written.
#[derive(Clone)]
pub(crate) enum Program {
    /// Referenced by name; viewers supply the outlines.
    Core(BuiltinFont),
    Embedded(Box<ParsedFont>),
}

/// A face usable by the page builder.
///
/// Widths are in thousandths of an em, the unit of PDF glyph space.
#[derive(Clone)]
pub struct Typeface {
    name: String,
    program: Program,
    widths: HashMap<char, u16>,
    replacement_width: u16,
    underline: (f64, f64),
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typeface")
            .field("name", &self.name)
            .field("encoding", &self.encoding())
            .field("glyphs", &self.widths.len())
            .finish()
    }
}

fn per_mille(advance: u16, units_per_em: f64) -> u16 {
    (f64::from(advance) * 1000.0 / units_per_em).round() as u16
}

impl Typeface {
    // -- Construction ---------------------------------------------------------

    /// One of the PDF core fonts. Metrics are read from the metric-compatible
    /// program `printpdf` bundles for it.
    pub fn core(font: BuiltinFont) -> Result<Self> {
        let subset = font.get_subset_font();
        let face = Face::parse(&subset.bytes, 0).map_err(|err| {
            FacsimileError::Font(format!("{}: unreadable metrics: {err}", font.get_id()))
        })?;
        let upem = f64::from(face.units_per_em());

        let mut widths = HashMap::new();
        for (_, c) in subset.glyph_mapping.values() {
            if let Some(advance) = face.glyph_index(*c).and_then(|g| face.glyph_hor_advance(g)) {
                widths.insert(*c, per_mille(advance, upem));
            }
        }
        // The core programs carry no space glyph; in every core family it has
        // the advance of the full stop.
        if let Some(stop) = widths.get(&'.').copied() {
            widths.entry(' ').or_insert(stop);
            widths.entry('\u{a0}').or_insert(stop);
        }

        Ok(Self::with_widths(
            font.get_id().to_string(),
            Program::Core(font),
            widths,
            (-100.0, 50.0),
        ))
    }

    /// Helvetica in the given style.
    pub fn helvetica(style: FontStyle) -> Result<Self> {
        Self::core(style.helvetica())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| {
            FacsimileError::Font(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_bytes(&data)
    }

    /// A TrueType face to embed. Only the glyphs actually shown are written.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let face = Face::parse(data, 0)
            .map_err(|err| FacsimileError::Font(format!("failed to parse TrueType data: {err}")))?;
        let upem = f64::from(face.units_per_em());

        let mut widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|cp| {
                    let Some(c) = char::from_u32(cp) else { return };
                    if let Some(glyph) = subtable.glyph_index(cp).filter(|g| g.0 != 0) {
                        let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
                        widths.entry(c).or_insert(per_mille(advance, upem));
                    }
                });
            }
        }
        if widths.is_empty() {
            return Err(FacsimileError::Font(
                "TrueType data has no Unicode character map".into(),
            ));
        }

        let name: String = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .unwrap_or_else(|| "EmbeddedFont".to_string())
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        let underline = face
            .underline_metrics()
            .map(|m| {
                (
                    f64::from(m.position) * 1000.0 / upem,
                    f64::from(m.thickness) * 1000.0 / upem,
                )
            })
            .unwrap_or((-100.0, 50.0));

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let parsed = ParsedFont::from_bytes(data, 0, &mut warnings)
            .ok_or_else(|| FacsimileError::Font(format!("{name}: not embeddable")))?;
        debug!(font = %name, warnings = warnings.len(), "Font program parsed");

        let face = Self::with_widths(name, Program::Embedded(Box::new(parsed)), widths, underline);
        info!(font = %face.name, glyphs = face.widths.len(), "TrueType font loaded");
        Ok(face)
    }

    fn with_widths(
        name: String,
        program: Program,
        widths: HashMap<char, u16>,
        underline: (f64, f64),
    ) -> Self {
        let replacement_width = widths.get(&REPLACEMENT).copied().unwrap_or(500);
        Self {
            name,
            program,
            widths,
            replacement_width,
            underline,
        }
    }

    // -- Metrics ----------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encoding(&self) -> TextEncoding {
        match self.program {
            Program::Core(_) => TextEncoding::Narrow,
            Program::Embedded(_) => TextEncoding::Wide,
        }
    }

    /// Whether the face has a glyph for `c`.
    pub fn covers(&self, c: char) -> bool {
        self.widths.contains_key(&c)
    }

    /// Advance of `c`, or of the replacement character when it is not covered.
    pub fn char_width(&self, c: char) -> u16 {
        self.widths
            .get(&c)
            .copied()
            .unwrap_or(self.replacement_width)
    }

    pub fn text_width(&self, text: &str) -> f64 {
        text.chars().map(|c| f64::from(self.char_width(c))).sum()
    }

    /// Underline position and thickness.
    pub fn underline_metrics(&self) -> (f64, f64) {
        self.underline
    }

    /// `text` with uncovered characters replaced, and how many were replaced.
    pub fn sanitize<'t>(&self, text: &'t str) -> (Cow<'t, str>, usize) {
        let missing = text.chars().filter(|c| !self.covers(*c)).count();
        if missing == 0 {
            return (Cow::Borrowed(text), 0);
        }
        let replaced = text
            .chars()
            .map(|c| if self.covers(c) { c } else { REPLACEMENT })
            .collect();
        (Cow::Owned(replaced), missing)
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    pub(crate) fn into_program(self) -> Program {
        self.program
    }
}

// -- Font sets ------------------------------------------------------------

/// The four styles used on generated pages.
#[derive(Debug, Clone)]
pub struct FontSet {
    faces: Vec<Typeface>,
}

impl FontSet {
    /// DejaVu Sans, shipped with the crate. Covers Latin, Greek and Cyrillic.
    pub fn bundled() -> Result<Self> {
        let faces = BUNDLED
            .iter()
            .map(|(name, data)| {
                Typeface::from_bytes(data)
                    .map_err(|err| FacsimileError::Font(format!("bundled {name}: {err}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { faces })
    }

    /// Helvetica family with WinAnsi encoding. Nothing is embedded.
    pub fn standard() -> Result<Self> {
        let faces = FontStyle::ALL
            .iter()
            .map(|s| Typeface::helvetica(*s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { faces })
    }

    /// TrueType faces loaded from disk.
    pub fn from_paths(paths: &FontPaths) -> Result<Self> {
        let faces = [
            &paths.regular,
            &paths.bold,
            &paths.italic,
            &paths.bold_italic,
        ]
        .into_iter()
        .map(Typeface::open)
        .collect::<Result<Vec<_>>>()?;
        Ok(Self { faces })
    }

    /// The faces a configuration asks for.
    pub fn from_source(source: &FontSource) -> Result<Self> {
        let set = match source {
            FontSource::Bundled => Self::bundled()?,
            FontSource::Standard => Self::standard()?,
            FontSource::Files(paths) => Self::from_paths(paths)?,
        };
        info!(regular = set.get(FontStyle::Regular).name(), "Fonts selected");
        Ok(set)
    }

    /// Build from arbitrary faces, ordered regular, bold, italic, bold-italic.
    pub fn from_faces(faces: [Typeface; 4]) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    pub fn get(&self, style: FontStyle) -> &Typeface {
        &self.faces[style.index()]
    }

    pub(crate) fn into_faces(self) -> Vec<Typeface> {
        self.faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths() {
        let font = Typeface::helvetica(FontStyle::Regular).unwrap();
        assert_eq!(font.char_width(' '), 278);
        assert_eq!(font.char_width('W'), 944);
        assert_eq!(font.text_width("Hello world"), 4945.0);
        assert_eq!(font.char_width('\u{2013}'), 556);
    }

    #[test]
    fn bold_is_wider() {
        let regular = Typeface::helvetica(FontStyle::Regular).unwrap();
        let bold = Typeface::helvetica(FontStyle::Bold).unwrap();
        assert!(bold.text_width("Biodiversity") > regular.text_width("Biodiversity"));
    }

    #[test]
    fn core_font_is_narrow_and_named() {
        let font = Typeface::helvetica(FontStyle::Italic).unwrap();
        assert_eq!(font.encoding(), TextEncoding::Narrow);
        assert_eq!(font.name(), "Helvetica-Oblique");
        assert!(font.covers('\u{e9}'));
        assert!(!font.covers('\u{3b1}'));
    }

    #[test]
    fn core_font_replaces_what_win_ansi_lacks() {
        let font = Typeface::helvetica(FontStyle::Regular).unwrap();
        let (text, missing) = font.sanitize("\u{dc}ber \u{142}\u{105}ka \u{3b1}\u{3b2}\u{3b3}");
        assert_eq!(text, "\u{dc}ber ??ka ???");
        assert_eq!(missing, 5);
        assert_eq!(font.char_width('\u{3b1}'), font.char_width('?'));
    }

    #[test]
    fn bundled_faces_are_wide_and_cover_greek_and_polish() {
        let set = FontSet::bundled().unwrap();
        let regular = set.get(FontStyle::Regular);
        assert_eq!(regular.encoding(), TextEncoding::Wide);
        assert_eq!(regular.name(), "DejaVuSans");
        let (text, missing) = regular.sanitize("\u{dc}ber \u{142}\u{105}ka \u{3b1}\u{3b2}\u{3b3}");
        assert_eq!(missing, 0);
        assert!(matches!(text, Cow::Borrowed(_)));
        assert_eq!(set.get(FontStyle::BoldItalic).name(), "DejaVuSans-BoldOblique");
    }

    #[test]
    fn garbage_truetype_is_font_error() {
        let err = Typeface::from_bytes(&[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, FacsimileError::Font(_)));
    }

    #[test]
    fn bundled_is_the_default_source() {
        let set = FontSet::from_source(&FontSource::default()).unwrap();
        assert_eq!(set.get(FontStyle::Regular).encoding(), TextEncoding::Wide);
        let set = FontSet::from_source(&FontSource::Standard).unwrap();
        assert_eq!(set.get(FontStyle::Regular).name(), "Helvetica");
    }

    #[test]
    fn font_set_orders_styles() {
        let set = FontSet::standard().unwrap();
        assert_eq!(set.get(FontStyle::Bold).name(), "Helvetica-Bold");
        assert_eq!(set.get(FontStyle::BoldItalic).name(), "Helvetica-BoldOblique");
    }
}
