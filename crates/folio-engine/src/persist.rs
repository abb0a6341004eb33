// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atomic output: finish into a temporary file, then move it over the
// destination.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use folio_core::error::Result;

/// Run `write` against a temporary file in `temp_directory` (the
/// destination's directory when `None`) and move the result to
/// `destination`. The destination is untouched if `write` fails.
#[instrument(skip_all, fields(destination = %destination.display()))]
pub fn write_atomically<F>(destination: &Path, temp_directory: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let directory = match temp_directory {
        Some(dir) => dir.to_path_buf(),
        None => parent_of(destination),
    };
    let mut temp = NamedTempFile::new_in(&directory)?;
    debug!(temp = %temp.path().display(), "Writing output");

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    match temp.persist(destination) {
        Ok(_) => Ok(()),
        Err(err) => {
            // Renames cannot cross filesystems.
            warn!(error = %err.error, "Rename failed, copying output instead");
            fs::copy(err.file.path(), destination)?;
            Ok(())
        }
    }
}

fn parent_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
