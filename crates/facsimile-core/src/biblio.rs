// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bibliographic records and citation formatting.
//
// Records arrive already resolved (fetched and cached elsewhere) in the
// PascalCase shape of the Biodiversity Heritage Library API.

use serde::{Deserialize, Serialize};

/// Sentence the audit looks for on the generated cover page.
pub const BHL_BOILERPLATE: &str =
    "This document was created from content at the Biodiversity Heritage Library";

/// Fixed document subject.
pub const BHL_SUBJECT: &str = "From the Biodiversity Heritage Library (BHL)";

pub const BHL_BASE_URL: &str = "https://www.biodiversitylibrary.org";

/// One article ("part") as described by the library catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BiblioRecord {
    #[serde(rename = "PartID")]
    pub part_id: u64,
    #[serde(rename = "ItemID")]
    pub item_id: u64,
    pub title: Option<String>,
    pub container_title: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub date: Option<String>,
    pub page_range: Option<String>,
    pub genre: Option<String>,
    pub doi: Option<String>,
    pub authors: Vec<Author>,
    pub rights_status: Option<String>,
    pub license_url: Option<String>,
    pub language: Option<String>,
    pub publication_details: Option<String>,
    pub start_page_number: Option<String>,
    pub end_page_number: Option<String>,
    pub identifiers: Vec<Identifier>,
    pub names: Vec<ScientificName>,
    pub pages: Vec<PageRef>,
    pub part_url: Option<String>,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Author {
    pub name: String,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Identifier {
    pub identifier_name: String,
    pub identifier_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ScientificName {
    pub name_confirmed: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PageRef {
    #[serde(rename = "PageID")]
    pub page_id: u64,
    pub page_numbers: Vec<PageNumber>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PageNumber {
    pub number: Option<String>,
}

/// Holding and rights details for the scanned volume an article lives in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemRecord {
    pub holding_institution: Option<String>,
    pub sponsor: Option<String>,
    pub rights_holder: Option<String>,
    pub rights: Option<String>,
    pub license_url: Option<String>,
}

/// Typographic role of a run of citation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentStyle {
    Regular,
    Italic,
    /// Underlined, coloured and clickable.
    Link(String),
}

/// A run of citation text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSegment {
    pub text: String,
    pub style: SegmentStyle,
}

impl CitationSegment {
    fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SegmentStyle::Regular,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Drop a single trailing comma, optionally followed by one whitespace char.
fn strip_trailing_comma(name: &str) -> &str {
    let trimmed = name
        .strip_suffix(|c: char| c.is_whitespace())
        .unwrap_or(name);
    trimmed.strip_suffix(',').unwrap_or(name)
}

/// First run of four consecutive ASCII digits.
fn first_year(date: &str) -> Option<&str> {
    let bytes = date.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .map(|i| &date[i..i + 4])
}

/// Collapse runs of hyphens and en dashes into one en dash.
fn normalise_dashes(range: &str) -> String {
    let mut out = String::with_capacity(range.len());
    let mut in_run = false;
    for c in range.chars() {
        if c == '-' || c == '\u{2013}' {
            if !in_run {
                out.push('\u{2013}');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

impl BiblioRecord {
    /// Author list for citations: "A", "A and B", "A, B, and C", "A et al.".
    pub fn author_string(&self) -> String {
        let names: Vec<&str> = self
            .authors
            .iter()
            .map(|a| strip_trailing_comma(&a.name))
            .collect();
        match names.as_slice() {
            [] => String::new(),
            [a] => (*a).to_string(),
            [a, b] => format!("{a} and {b}"),
            [a, b, c] => format!("{a}, {b}, and {c}"),
            [a, ..] => format!("{a} et al."),
        }
    }

    /// The citation as styled runs, in display order.
    pub fn citation_segments(&self) -> Vec<CitationSegment> {
        let mut segments = Vec::new();

        let authors = self.author_string();
        if !authors.is_empty() {
            if authors.trim_end().ends_with('.') {
                segments.push(CitationSegment::regular(format!("{authors} ")));
            } else {
                segments.push(CitationSegment::regular(format!("{authors}. ")));
            }
        }
        if let Some(date) = non_empty(&self.date) {
            let year = first_year(date).unwrap_or(date);
            segments.push(CitationSegment::regular(format!("{year}. ")));
        }
        if let Some(title) = non_empty(&self.title) {
            if title.ends_with(['\'', '?', ',', '.', ':', ';']) {
                segments.push(CitationSegment::regular(format!("\"{title}\" ")));
            } else {
                segments.push(CitationSegment::regular(format!("\"{title}.\" ")));
            }
        }
        if let Some(container) = non_empty(&self.container_title) {
            segments.push(CitationSegment {
                text: format!("{container} "),
                style: SegmentStyle::Italic,
            });
        }

        let mut vol_issue = String::new();
        if let Some(volume) = non_empty(&self.volume) {
            vol_issue.push_str(volume);
        }
        if let Some(issue) = non_empty(&self.issue) {
            vol_issue.push_str(&format!("({issue})"));
        }
        if !vol_issue.is_empty() {
            segments.push(CitationSegment::regular(format!("{vol_issue}, ")));
        }

        if let Some(range) = non_empty(&self.page_range) {
            segments.push(CitationSegment::regular(format!(
                "{}. ",
                normalise_dashes(range)
            )));
        }
        if let Some(url) = self.doi_url() {
            segments.push(CitationSegment {
                text: url.clone(),
                style: SegmentStyle::Link(url),
            });
            segments.push(CitationSegment::regular("."));
        }

        for segment in &mut segments {
            segment.text.retain(|c| c != '\0');
        }
        segments
    }

    /// Plain-text citation; also used as the document title.
    pub fn citation(&self) -> String {
        self.citation_segments()
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    /// `Name (Dates)` for each author, joined by "; ".
    pub fn author_metadata(&self) -> String {
        self.authors
            .iter()
            .map(|a| match non_empty(&a.dates) {
                Some(dates) => format!("{} ({dates})", a.name),
                None => a.name.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Confirmed scientific names, commas replaced so the list stays splittable.
    pub fn keywords(&self) -> Vec<String> {
        self.names
            .iter()
            .map(|n| n.name_confirmed.trim())
            .filter(|n| !n.is_empty())
            .map(|n| n.replace(',', ";"))
            .collect()
    }

    pub fn doi_url(&self) -> Option<String> {
        non_empty(&self.doi).map(|doi| format!("https://doi.org/{doi}"))
    }

    pub fn item_url(&self) -> String {
        format!("{BHL_BASE_URL}/item/{}", self.item_id)
    }

    pub fn permalink(&self) -> String {
        format!("{BHL_BASE_URL}/partpdf/{}", self.part_id)
    }

    /// Creator property: the part URL when known, otherwise the item URL.
    pub fn creator_url(&self) -> String {
        non_empty(&self.part_url)
            .map(str::to_string)
            .unwrap_or_else(|| self.item_url())
    }

    /// Whether the article is hosted outside the library (nothing to build).
    pub fn is_external(&self) -> bool {
        non_empty(&self.external_url).is_some()
    }

    /// Identifier value by scheme name, e.g. "ISSN".
    pub fn identifier(&self, scheme: &str) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.identifier_name == scheme)
            .map(|i| i.identifier_value.as_str())
    }
}
