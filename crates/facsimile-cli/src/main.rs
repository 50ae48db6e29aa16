// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// facsimile: build and audit searchable facsimile PDFs for library articles.
//
// Entry point. Initialises logging, loads configuration and the job
// manifest, then runs one article end to end.

mod manifest;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use facsimile_core::config::FacsimileConfig;
use facsimile_core::error::Result;
use facsimile_document::audit::{audit, hash_bytes};
use facsimile_document::tagging::{ExifTool, MetadataTagger, XmpTags};
use facsimile_document::{ArticleInputs, AssemblyOptions, FontSet, PageImage, assemble};

use manifest::Manifest;
use output::{output_path, write_atomically};

/// Build searchable facsimile PDFs from page scans and OCR geometry
#[derive(Parser, Debug)]
#[command(name = "facsimile")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "FACSIMILE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble one article from its job manifest
    Generate {
        /// Job manifest (record, OCR sources, ordered pages)
        manifest: PathBuf,

        /// Output root, overriding `paths.output`
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Omit the generation timestamp for byte-stable output
        #[arg(long)]
        no_timestamp: bool,
    },
    /// Check a finished file's page count and cover boilerplate
    Audit {
        /// Job manifest the file was built from
        manifest: PathBuf,

        /// File to audit, instead of the configured output location
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            tracing::error!(error = %err, retriable = err.is_retriable(), "facsimile failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command succeeded on its own terms (audits may fail
/// without an error).
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => FacsimileConfig::load(path)?,
        None => FacsimileConfig::default(),
    };
    config.validate()?;

    match cli.command {
        Command::Generate {
            manifest,
            output,
            no_timestamp,
        } => {
            let manifest = Manifest::load(&manifest)?;
            let root = output.unwrap_or_else(|| config.paths.output.clone());
            generate(&config, &manifest, &root, !no_timestamp)?;
            Ok(true)
        }
        Command::Audit { manifest, file } => {
            let manifest = Manifest::load(&manifest)?;
            let path = file.unwrap_or_else(|| target_path(&config, &config.paths.output, &manifest));
            let bytes = std::fs::read(&path)?;
            let report = audit(&bytes, manifest.pages.len(), config.cover.include)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(report.passed())
        }
    }
}

fn target_path(config: &FacsimileConfig, root: &Path, manifest: &Manifest) -> PathBuf {
    output_path(
        root,
        &config.paths.file_prefix,
        manifest.record.part_id,
        config.variant_suffix(),
    )
}

fn generate(
    config: &FacsimileConfig,
    manifest: &Manifest,
    root: &Path,
    timestamp: bool,
) -> Result<()> {
    let record = &manifest.record;
    if record.is_external() {
        tracing::info!(part_id = record.part_id, "Article is hosted externally; nothing to build");
        return Ok(());
    }
    tracing::info!(part_id = record.part_id, pages = manifest.pages.len(), "Generating");

    let ocr = manifest.load_ocr()?;
    let pages = manifest.load_pages()?;
    let logo = match &config.cover.logo {
        Some(path) => Some(PageImage::open(path)?.flatten()),
        None => None,
    };
    let fonts = FontSet::from_source(&config.fonts)?;
    let options = AssemblyOptions::from_config(config).generated_at(timestamp.then(Utc::now));

    let bytes = assemble(
        ArticleInputs {
            record,
            item: &manifest.item,
            ocr: &ocr,
            pages,
            logo,
        },
        fonts,
        options,
    )?;

    let path = target_path(config, root, manifest);
    write_atomically(&path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        sha256 = %hash_bytes(&bytes),
        "PDF written"
    );

    // Tags are written into the closed, complete file.
    if let Some(binary) = &config.tagging.exiftool {
        ExifTool::new(binary).tag(&path, &XmpTags::from_records(record, &manifest.item))?;
    }
    Ok(())
}
