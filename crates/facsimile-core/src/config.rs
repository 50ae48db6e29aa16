// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FacsimileError, Result};
use crate::types::{Envelope, SizingPolicy, TextLayer};

/// Complete run configuration. Every section falls back to its defaults when
/// omitted from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacsimileConfig {
    pub image: ImageConfig,
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub cover: CoverConfig,
    /// Faces for generated text. Defaults to the bundled Unicode family.
    pub fonts: FontSource,
    pub paths: PathsConfig,
    pub tagging: TaggingConfig,
    pub pdf: PdfConfig,
}

/// Source image handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Resize factor applied to scans and OCR coordinates alike.
    pub resize: f64,
    /// Convert scans to grayscale before embedding.
    pub desaturate: bool,
    /// JPEG quality (1-100) used when a scan has to be re-encoded.
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            resize: 1.0,
            desaturate: false,
            jpeg_quality: 85,
        }
    }
}

/// Page geometry planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub policy: SizingPolicy,
    pub envelope: Envelope,
}

/// OCR text layer rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_size_pt: f64,
    /// Inner cell margin in millimetres.
    pub inner_margin_mm: f64,
    pub layer: TextLayer,
    /// Stroke each OCR line's target rectangle.
    pub outline_lines: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_size_pt: 10.0,
            inner_margin_mm: 1.0,
            layer: TextLayer::Invisible,
            outline_lines: false,
        }
    }
}

/// Generated citation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub include: bool,
    /// Institutional logo (PNG or JPEG).
    pub logo: Option<PathBuf>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            include: true,
            logo: None,
        }
    }
}

/// Where the faces for generated text come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// DejaVu Sans, compiled into the binary. Embedded and subset.
    #[default]
    Bundled,
    /// PDF core Helvetica. Nothing embedded; WinAnsi characters only.
    Standard,
    /// TrueType files on disk. Embedded and subset.
    Files(FontPaths),
}

/// TrueType font files for the four styles used on generated pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontPaths {
    pub regular: PathBuf,
    pub bold: PathBuf,
    pub italic: PathBuf,
    pub bold_italic: PathBuf,
}

/// Output placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output: PathBuf,
    pub file_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("./output"),
            file_prefix: "bhl-segment-".to_string(),
        }
    }
}

/// External metadata tagger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Path to the `exiftool` binary. Tagging is skipped when unset.
    pub exiftool: Option<PathBuf>,
}

/// PDF serialisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Deflate content streams.
    pub compress: bool,
}

impl FacsimileConfig {
    /// Read and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Reject values that would make geometry or encoding meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.image.resize.is_finite() && self.image.resize > 0.0) {
            return Err(FacsimileError::Config(format!(
                "image.resize must be positive, got {}",
                self.image.resize
            )));
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(FacsimileError::Config(format!(
                "image.jpeg_quality must be within 1..=100, got {}",
                self.image.jpeg_quality
            )));
        }
        let envelope = &self.layout.envelope;
        if !(envelope.width_mm > 0.0 && envelope.height_mm > 0.0) {
            return Err(FacsimileError::Config(format!(
                "layout.envelope must be positive, got {}x{}",
                envelope.width_mm, envelope.height_mm
            )));
        }
        if !(self.text.font_size_pt > 0.0) {
            return Err(FacsimileError::Config(format!(
                "text.font_size_pt must be positive, got {}",
                self.text.font_size_pt
            )));
        }
        if self.text.inner_margin_mm < 0.0 {
            return Err(FacsimileError::Config(
                "text.inner_margin_mm must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// File-name variant suffix for this configuration.
    pub fn variant_suffix(&self) -> &'static str {
        if self.image.desaturate { "-grey" } else { "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: FacsimileConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.image.resize, 1.0);
        assert_eq!(config.layout.policy, SizingPolicy::PerPage);
        assert_eq!(config.layout.envelope, Envelope::A4);
        assert_eq!(config.text.font_size_pt, 10.0);
        assert!(config.cover.include);
        assert_eq!(config.fonts, FontSource::Bundled);
        assert_eq!(config.paths.file_prefix, "bhl-segment-");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config: FacsimileConfig = serde_json::from_str(
            r#"{ "image": { "desaturate": true }, "layout": { "policy": "uniform_document" } }"#,
        )
        .unwrap();
        assert!(config.image.desaturate);
        assert_eq!(config.image.jpeg_quality, 85);
        assert_eq!(config.layout.policy, SizingPolicy::UniformDocument);
        assert_eq!(config.variant_suffix(), "-grey");
    }

    #[test]
    fn font_source_is_tagged_by_kind() {
        let config: FacsimileConfig =
            serde_json::from_str(r#"{ "fonts": { "kind": "standard" } }"#).unwrap();
        assert_eq!(config.fonts, FontSource::Standard);

        let config: FacsimileConfig = serde_json::from_str(
            r#"{ "fonts": { "kind": "files", "regular": "r.ttf", "bold": "b.ttf",
                 "italic": "i.ttf", "bold_italic": "bi.ttf" } }"#,
        )
        .unwrap();
        match config.fonts {
            FontSource::Files(paths) => assert_eq!(paths.bold, PathBuf::from("b.ttf")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_resize() {
        let mut config = FacsimileConfig::default();
        config.image.resize = 0.0;
        assert!(matches!(config.validate(), Err(FacsimileError::Config(_))));
    }

    #[test]
    fn rejects_bad_quality() {
        let mut config = FacsimileConfig::default();
        config.image.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "text": { "layer": "visible" } }"#).unwrap();
        let config = FacsimileConfig::load(&path).unwrap();
        assert_eq!(config.text.layer, TextLayer::Visible);
    }
}
