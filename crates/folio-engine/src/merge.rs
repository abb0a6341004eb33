// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge strategy: every pending page into one output file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use folio_core::codec::{Codec, OutputDocument, SourceHandle};
use folio_core::error::{FolioError, Result};
use folio_core::{File, Page};

use crate::attachments::AttachmentRegistry;
use crate::composer::{Composer, SaveJob, Strategy};
use crate::persist::write_atomically;

/// Writes all pending pages, in order, into a single PDF.
#[derive(Debug, Default, Clone, Copy)]
pub struct Merge;

/// A composer that merges.
pub type Merger<C> = Composer<C, Merge>;

impl<C: Codec> Merger<C> {
    pub fn new(codec: C) -> Self {
        Composer::with_strategy(codec, Merge)
    }
}

impl Strategy for Merge {
    #[instrument(skip_all, fields(pages = job.pages.len()))]
    fn save<C: Codec>(&mut self, mut job: SaveJob<'_, C>, destination: &Path) -> Result<()> {
        let result = merge(&mut job, destination);
        job.pool.release();
        result
    }
}

fn merge<C: Codec>(job: &mut SaveJob<'_, C>, destination: &Path) -> Result<()> {
    if job.pages.is_empty() {
        return Err(FolioError::NothingToSave);
    }

    let mut output = job.pool.codec().create_output(job.options)?;
    let mut registry = AttachmentRegistry::new();
    let mut scanned: HashSet<PathBuf> = HashSet::new();

    let chunks = chunks(job.pages);
    debug!(chunks = chunks.len(), "Pages grouped by source");

    for chunk in chunks {
        let first = &chunk[0];
        let handle = job.pool.get(first, &job.options.open)?;

        for batch in batches(chunk) {
            for page in batch {
                handle.set_rotation(page.number(), page.effective_rotation())?;
            }
            let numbers: Vec<u32> = batch.iter().map(Page::number).collect();
            output
                .copy_pages(handle, &numbers)
                .map_err(restricted_to_conflict)?;
        }

        let path = first.file().full_name();
        if matches!(first.file().as_ref(), File::Pdf(_)) && scanned.insert(path.to_path_buf()) {
            let found = registry.extend(handle.attachments()?)?;
            debug!(path = %path.display(), found, "Source attachments collected");
        }
    }

    registry.extend(job.attachments.iter().cloned())?;
    for attachment in registry.iter() {
        output.embed_attachment(attachment)?;
    }

    let pages = output.page_count();
    write_atomically(destination, job.options.temp_directory.as_deref(), |writer| {
        output.finish(writer, job.metadata, job.encryption)
    })?;
    info!(pages, attachments = registry.len(), "Merged");
    Ok(())
}

/// Maximal runs of consecutive pages from the same file, in order.
pub fn chunks(pages: &[Page]) -> Vec<&[Page]> {
    pages
        .chunk_by(|a, b| a.file().full_name() == b.file().full_name())
        .collect()
}

/// Split a chunk wherever a page number repeats, so every copied page sees
/// its own rotation on the shared handle.
fn batches(chunk: &[Page]) -> Vec<&[Page]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut seen = HashSet::new();
    for (index, page) in chunk.iter().enumerate() {
        if !seen.insert(page.number()) {
            batches.push(&chunk[start..index]);
            start = index;
            seen.clear();
            seen.insert(page.number());
        }
    }
    batches.push(&chunk[start..]);
    batches
}

fn restricted_to_conflict(err: FolioError) -> FolioError {
    match err {
        FolioError::RestrictedSource { path } => FolioError::EncryptionConflict {
            path,
            reason: "full access was requested but only user rights are available".into(),
        },
        other => other,
    }
}
