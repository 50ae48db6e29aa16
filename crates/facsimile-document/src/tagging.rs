// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Descriptive and rights metadata written into a finished file by an
// external tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use facsimile_core::biblio::{BHL_BASE_URL, BiblioRecord, ItemRecord};
use facsimile_core::error::{FacsimileError, Result};
use tracing::{debug, info, instrument};

/// One tag assignment. `append` adds to a list-valued tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpTag {
    pub name: String,
    pub value: String,
    pub append: bool,
}

impl XmpTag {
    fn set(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            append: false,
        }
    }

    fn add(name: &str, value: impl Into<String>) -> Self {
        Self {
            append: true,
            ..Self::set(name, value)
        }
    }

    /// Command-line form, e.g. `-XMP:Creator+=Smith`. Passed as a single
    /// process argument, so no shell quoting is needed.
    pub fn to_arg(&self) -> String {
        let op = if self.append { "+=" } else { "=" };
        format!("-{}{}{}", self.name, op, self.value)
    }
}

/// The full tag list for one article, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpTags(Vec<XmpTag>);

impl XmpTags {
    pub fn from_records(record: &BiblioRecord, item: &ItemRecord) -> Self {
        let mut tags = Vec::new();
        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        if let Some(doi) = present(&record.doi) {
            tags.push(XmpTag::set("XMP:DOI", doi));
        }
        tags.push(XmpTag::set("XMP:Title", record.citation()));
        for author in &record.authors {
            let name = match present(&author.dates) {
                Some(dates) => format!("{} ({dates})", author.name),
                None => author.name.clone(),
            };
            let name: String = name.trim().chars().filter(|&c| c != '\0').collect();
            tags.push(XmpTag::add("XMP:Creator", name));
        }

        if record.genre.as_deref() == Some("Article") {
            tags.push(XmpTag::set("XMP:AggregationType", "Article"));
            tags.push(XmpTag::set(
                "XMP:PublicationName",
                record.container_title.clone().unwrap_or_default(),
            ));
            tags.push(XmpTag::set(
                "XMP:Source",
                format!("{BHL_BASE_URL}/item/{}", record.item_id),
            ));
            tags.push(XmpTag::set(
                "XMP:Volume",
                record.volume.clone().unwrap_or_default(),
            ));
            let optional = [
                ("XMP:Number", &record.issue),
                ("XMP:StartingPage", &record.start_page_number),
                ("XMP:EndingPage", &record.end_page_number),
                ("XMP:PageRange", &record.page_range),
            ];
            for (name, value) in optional {
                if let Some(value) = value {
                    tags.push(XmpTag::set(name, value.clone()));
                }
            }
            if record.language.is_some() {
                tags.push(XmpTag::set(
                    "XMP:Publisher",
                    record.publication_details.clone().unwrap_or_default(),
                ));
            }
            if let Some(language) = &record.language {
                tags.push(XmpTag::set("XMP:Language", language.clone()));
            }
            if let Some(rights) = &record.rights_status {
                tags.push(XmpTag::set("XMP:Rights", rights.clone()));
            }
            if let Some(holder) = &item.rights_holder {
                tags.push(XmpTag::set("XMP:RightsOwner", holder.clone()));
                tags.push(XmpTag::set(
                    "XMP:License",
                    item.license_url.clone().unwrap_or_default(),
                ));
            }
            for name in &record.names {
                let name = name.name_confirmed.trim();
                if !name.is_empty() {
                    tags.push(XmpTag::add("keywords", name));
                }
            }
            for identifier in &record.identifiers {
                match identifier.identifier_name.as_str() {
                    "ISSN" => tags.push(XmpTag::set("XMP:ISSN", identifier.identifier_value.clone())),
                    "BioStor" => tags.push(XmpTag::set(
                        "XMP-dc:Identifier",
                        format!("BioStor:{}", identifier.identifier_value),
                    )),
                    _ => {}
                }
            }
        }

        let mut page_ids = Vec::with_capacity(record.pages.len());
        for page in &record.pages {
            page_ids.push(page.page_id.to_string());
            let numbers: String = page
                .page_numbers
                .iter()
                .filter_map(|n| n.number.as_deref())
                .collect();
            if !numbers.is_empty() {
                tags.push(XmpTag::add("XMP:PageInfo", format!("{{PageNumber={numbers}}}")));
            }
        }
        tags.push(XmpTag::set(
            "XMP:Notes",
            format!("BHL PageIDs: {}", page_ids.join(",")),
        ));

        if let Some(date) = &record.date {
            tags.push(XmpTag::set("XMP:Date", date.clone()));
        }
        Self(tags)
    }

    pub fn iter(&self) -> impl Iterator<Item = &XmpTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_args(&self) -> Vec<String> {
        self.0.iter().map(XmpTag::to_arg).collect()
    }
}

/// Rewrites a closed, complete file in place with metadata tags.
pub trait MetadataTagger {
    fn tag(&self, path: &Path, tags: &XmpTags) -> Result<()>;
}

/// Tags files by running the `exiftool` binary.
#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: PathBuf,
}

impl ExifTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Full argument list for one invocation.
    pub fn args(path: &Path, tags: &XmpTags) -> Vec<String> {
        let mut args = vec!["-json".to_string(), "-overwrite_original".to_string()];
        args.extend(tags.to_args());
        args.push(path.display().to_string());
        args
    }
}

impl MetadataTagger for ExifTool {
    #[instrument(skip_all, fields(path = %path.display(), tags = tags.len()))]
    fn tag(&self, path: &Path, tags: &XmpTags) -> Result<()> {
        let output = Command::new(&self.binary)
            .args(Self::args(path, tags))
            .output()
            .map_err(|err| {
                FacsimileError::Tagging(format!("cannot run {}: {}", self.binary.display(), err))
            })?;
        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "Tagger output");
        if !output.status.success() {
            return Err(FacsimileError::Tagging(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!("Metadata tags written");
        Ok(())
    }
}
