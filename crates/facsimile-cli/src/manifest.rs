// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job manifest: the already-resolved inputs for one article.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use facsimile_core::biblio::{BiblioRecord, ItemRecord};
use facsimile_core::error::{FacsimileError, Result};
use facsimile_document::assemble::SourcePage;
use facsimile_document::image::ScanSource;
use facsimile_document::ocr::{OcrDocument, OcrLibrary};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// One page of the article, in output order.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPage {
    pub page_id: u64,
    /// Scan image, relative to the manifest file unless absolute.
    pub image: PathBuf,
    /// Key into `ocr_sources`.
    pub source: String,
    /// 1-based position of the page in its OCR file.
    pub sequence: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub record: BiblioRecord,
    #[serde(default)]
    pub item: ItemRecord,
    /// OCR XML per source identifier.
    pub ocr_sources: BTreeMap<String, PathBuf>,
    pub pages: Vec<ManifestPage>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Manifest {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut manifest: Manifest = serde_json::from_str(&raw)?;
        manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        manifest.validate()?;
        debug!(
            part_id = manifest.record.part_id,
            pages = manifest.pages.len(),
            sources = manifest.ocr_sources.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(FacsimileError::Config("manifest lists no pages".into()));
        }
        for page in &self.pages {
            if !self.ocr_sources.contains_key(&page.source) {
                return Err(FacsimileError::Config(format!(
                    "page {} names unknown OCR source {}",
                    page.page_id, page.source
                )));
            }
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Parse every OCR source once.
    pub fn load_ocr(&self) -> Result<OcrLibrary> {
        let mut library = OcrLibrary::new();
        for (source, path) in &self.ocr_sources {
            library.insert(source.clone(), OcrDocument::open(self.resolve(path))?);
        }
        info!(sources = library.len(), "OCR sources parsed");
        Ok(library)
    }

    /// Read every scan's header. Any missing or unrecognised image fails the
    /// whole run; pixels are decoded later, one page at a time.
    pub fn load_pages(&self) -> Result<Vec<SourcePage>> {
        self.pages
            .iter()
            .map(|page| {
                Ok(SourcePage {
                    page_id: page.page_id,
                    ocr_source: page.source.clone(),
                    sequence: page.sequence,
                    scan: ScanSource::open(self.resolve(&page.image))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{
                "record": {"PartID": 12345, "ItemID": 9, "Title": "Frogs"},
                "ocr_sources": {"vol": "vol_djvu.xml"},
                "pages": [{"page_id": 1, "image": "p1.jpg", "source": "vol", "sequence": 1}]
            }"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.record.part_id, 12345);
        assert_eq!(manifest.resolve(Path::new("p1.jpg")), dir.path().join("p1.jpg"));
        assert_eq!(manifest.resolve(Path::new("/abs/p.jpg")), PathBuf::from("/abs/p.jpg"));
    }

    #[test]
    fn unknown_source_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{
                "record": {"PartID": 1},
                "ocr_sources": {},
                "pages": [{"page_id": 1, "image": "p1.jpg", "source": "vol", "sequence": 1}]
            }"#,
        )
        .unwrap();
        assert!(matches!(Manifest::load(&path), Err(FacsimileError::Config(_))));
    }

    #[test]
    fn missing_scan_is_image_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(
            &path,
            r#"{
                "record": {"PartID": 1},
                "ocr_sources": {"vol": "x.xml"},
                "pages": [{"page_id": 1, "image": "missing.jpg", "source": "vol", "sequence": 1}]
            }"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert!(matches!(
            manifest.load_pages(),
            Err(FacsimileError::ImageUnavailable(_))
        ));
    }

    #[test]
    fn html_saved_as_scan_is_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(dir.path().join("p1.jpg"), b"<html>404</html>").unwrap();
        std::fs::write(
            &path,
            r#"{
                "record": {"PartID": 1},
                "ocr_sources": {"vol": "x.xml"},
                "pages": [{"page_id": 1, "image": "p1.jpg", "source": "vol", "sequence": 1}]
            }"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert!(matches!(
            manifest.load_pages(),
            Err(FacsimileError::NotAnImage(_))
        ));
    }
}
