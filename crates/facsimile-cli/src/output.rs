// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output placement: sharded file names and all-or-nothing writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use facsimile_core::error::{FacsimileError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// `<root>/<d1>/<d2>/<prefix><id><suffix>.pdf`, sharded by the first two
/// digits of the article id.
pub fn output_path(root: &Path, prefix: &str, id: u64, suffix: &str) -> PathBuf {
    let digits = id.to_string();
    let mut path = root.to_path_buf();
    for shard in digits.chars().take(2) {
        path.push(shard.to_string());
    }
    path.push(format!("{prefix}{digits}{suffix}.pdf"));
    path
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// so `path` never holds a partial document.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| FacsimileError::Config(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| FacsimileError::Io(err.error))?;
    debug!(path = %path.display(), "Output persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shards_by_leading_digits() {
        let path = output_path(Path::new("/out"), "bhl-segment-", 12345, "-grey");
        assert_eq!(path, PathBuf::from("/out/1/2/bhl-segment-12345-grey.pdf"));
    }

    #[test]
    fn single_digit_id_has_one_shard() {
        let path = output_path(Path::new("out"), "bhl-segment-", 7, "");
        assert_eq!(path, PathBuf::from("out/7/bhl-segment-7.pdf"));
    }

    #[test]
    fn atomic_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "p-", 42, "");
        write_atomically(&path, b"%PDF-1.5").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
