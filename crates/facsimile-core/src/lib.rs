// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// facsimile-core: core types, configuration and error definitions shared across all crates.

pub mod biblio;
pub mod config;
pub mod error;
pub mod types;

pub use biblio::{BiblioRecord, ItemRecord};
pub use config::FacsimileConfig;
pub use error::{FacsimileError, Result};
pub use types::*;
