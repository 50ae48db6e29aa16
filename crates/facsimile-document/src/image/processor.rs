// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan preparation: validate page images from their headers, then decode,
// resize, desaturate and re-encode them one at a time for embedding.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use facsimile_core::error::{FacsimileError, Result};
use facsimile_core::types::PageImageSpec;
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader};
use tracing::{debug, info, instrument};

/// Colour model of an embedded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static [u8] {
        match self {
            ColorSpace::Gray => b"DeviceGray",
            ColorSpace::Rgb => b"DeviceRGB",
        }
    }
}

/// Pixel data ready to become an image XObject.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    /// JPEG stream when `dct` is set, otherwise raw 8-bit samples.
    pub data: Vec<u8>,
    pub dct: bool,
}

enum ScanData {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// A scan whose header has been read but whose pixels have not.
///
/// Only the dimensions are known until [`ScanSource::decode`], so a whole
/// article can be planned without holding every page in memory.
pub struct ScanSource {
    data: ScanData,
    width: u32,
    height: u32,
    label: String,
}

impl ScanSource {
    /// Read the dimensions of a scan on disk. A missing or empty file is
    /// `ImageUnavailable`; an unrecognised header is `NotAnImage`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let unavailable =
            |err: std::io::Error| FacsimileError::ImageUnavailable(format!("{label}: {err}"));
        let len = std::fs::metadata(path).map_err(unavailable)?.len();
        if len == 0 {
            return Err(FacsimileError::ImageUnavailable(format!("{label}: zero bytes")));
        }
        let (width, height) = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(unavailable)?
            .into_dimensions()
            .map_err(|err| FacsimileError::NotAnImage(format!("{label}: {err}")))?;
        debug!(width, height, "Scan header read");
        Ok(Self {
            data: ScanData::File(path.to_path_buf()),
            width,
            height,
            label,
        })
    }

    /// Read the dimensions of an encoded scan already in memory.
    pub fn from_bytes(data: Vec<u8>, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if data.is_empty() {
            return Err(FacsimileError::ImageUnavailable(format!("{label}: zero bytes")));
        }
        let (width, height) = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|err| FacsimileError::ImageUnavailable(format!("{label}: {err}")))?
            .into_dimensions()
            .map_err(|err| FacsimileError::NotAnImage(format!("{label}: {err}")))?;
        Ok(Self {
            data: ScanData::Memory(data),
            width,
            height,
            label,
        })
    }

    pub fn spec(&self) -> PageImageSpec {
        PageImageSpec::new(self.width, self.height)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Decode the pixels. The decoded size must agree with the header.
    #[instrument(skip(self), fields(label = %self.label))]
    pub fn decode(self) -> Result<PageImage> {
        let data = match self.data {
            ScanData::Memory(data) => data,
            ScanData::File(path) => std::fs::read(&path).map_err(|err| {
                FacsimileError::ImageUnavailable(format!("{}: {}", self.label, err))
            })?,
        };
        let image = PageImage::from_bytes(data, self.label)?;
        if (image.width(), image.height()) != (self.width, self.height) {
            return Err(FacsimileError::Image(format!(
                "{}: header says {}x{} but decoded {}x{}",
                image.label,
                self.width,
                self.height,
                image.width(),
                image.height()
            )));
        }
        Ok(image)
    }
}

/// A decoded source scan.
///
/// Operations consume `self` and return the transformed image, so calls
/// chain:
///
/// ```ignore
/// let embedded = PageImage::open("page_0001.jpg")?
///     .prepare(0.5, true, 85)?;
/// ```
pub struct PageImage {
    image: DynamicImage,
    /// Original bytes when the source is a JPEG that could be embedded as is.
    jpeg: Option<Vec<u8>>,
    label: String,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Load a scan from disk. A missing file is `ImageUnavailable`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|err| {
            FacsimileError::ImageUnavailable(format!("{}: {}", path.display(), err))
        })?;
        Self::from_bytes(data, path.display().to_string())
    }

    /// Decode a scan from encoded bytes (JPEG, PNG, ...).
    #[instrument(skip_all, fields(data_len = data.len()))]
    pub fn from_bytes(data: Vec<u8>, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if data.is_empty() {
            return Err(FacsimileError::ImageUnavailable(format!("{label}: zero bytes")));
        }
        let format = image::guess_format(&data)
            .map_err(|err| FacsimileError::NotAnImage(format!("{label}: {err}")))?;
        let image = image::load_from_memory_with_format(&data, format)
            .map_err(|err| FacsimileError::NotAnImage(format!("{label}: {err}")))?;

        let jpeg = (format == ImageFormat::Jpeg && jpeg_is_embeddable(&data)).then_some(data);
        debug!(
            width = image.width(),
            height = image.height(),
            ?format,
            passthrough = jpeg.is_some(),
            "Image decoded"
        );
        Ok(Self { image, jpeg, label })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn spec(&self) -> PageImageSpec {
        PageImageSpec::new(self.width(), self.height())
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize to exactly `width` x `height`.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        if (width, height) == (self.width(), self.height()) {
            return self;
        }
        let resized = self
            .image
            .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self {
            image: resized,
            jpeg: None,
            label: self.label,
        }
    }

    /// Convert to grayscale (luma).
    pub fn grayscale(self) -> Self {
        if matches!(self.image, DynamicImage::ImageLuma8(_)) {
            return self;
        }
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
            jpeg: None,
            label: self.label,
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Scale by `factor` (truncating to whole pixels), optionally desaturate,
    /// and produce a JPEG for embedding. Untouched gray or RGB JPEG sources
    /// are passed through byte for byte.
    #[instrument(skip(self), fields(label = %self.label))]
    pub fn prepare(self, factor: f64, desaturate: bool, quality: u8) -> Result<EmbeddedImage> {
        let (width, height) = self.spec().scaled(factor);
        if width == 0 || height == 0 {
            return Err(FacsimileError::DegenerateGeometry(format!(
                "{}: {}x{} scaled by {} is empty",
                self.label,
                self.width(),
                self.height(),
                factor
            )));
        }

        let mut prepared = self.resize_exact(width, height);
        if desaturate {
            prepared = prepared.grayscale();
        }

        let color_space = match prepared.image {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => ColorSpace::Gray,
            _ => ColorSpace::Rgb,
        };

        let data = match prepared.jpeg.take() {
            Some(bytes) => bytes,
            None => prepared.to_jpeg_bytes(color_space, quality)?,
        };
        info!(width, height, ?color_space, bytes = data.len(), "Scan prepared");
        Ok(EmbeddedImage {
            width,
            height,
            color_space,
            data,
            dct: true,
        })
    }

    /// Raw RGB samples with any alpha composited over white. Used for logos.
    pub fn flatten(self) -> EmbeddedImage {
        let rgba = self.image.to_rgba8();
        let mut data = Vec::with_capacity((rgba.width() * rgba.height() * 3) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                data.push(blended as u8);
            }
        }
        EmbeddedImage {
            width: rgba.width(),
            height: rgba.height(),
            color_space: ColorSpace::Rgb,
            data,
            dct: false,
        }
    }

    fn to_jpeg_bytes(&self, color_space: ColorSpace, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        let encoded = match color_space {
            ColorSpace::Gray => self.image.to_luma8().write_with_encoder(encoder),
            ColorSpace::Rgb => self.image.to_rgb8().write_with_encoder(encoder),
        };
        encoded.map_err(|err| {
            FacsimileError::Image(format!("{}: JPEG encoding failed: {}", self.label, err))
        })?;
        Ok(buffer)
    }
}

/// Whether a JPEG's native colour model can go straight into a DCTDecode
/// stream (8-bit gray or RGB; not CMYK).
fn jpeg_is_embeddable(data: &[u8]) -> bool {
    JpegDecoder::new(Cursor::new(data))
        .map(|decoder| {
            matches!(
                decoder.original_color_type(),
                ExtendedColorType::L8 | ExtendedColorType::Rgb8
            )
        })
        .unwrap_or(false)
}
