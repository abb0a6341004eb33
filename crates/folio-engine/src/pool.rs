// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw source pool: at most one open handle per distinct file for the
// duration of one save.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use folio_core::codec::Codec;
use folio_core::config::OpenOption;
use folio_core::error::Result;
use folio_core::{File, Page};

/// Open source handles keyed by the file's `full_name` exactly as stored on
/// the [`File`]. Readers normalize that name once, when the file is first
/// described, so binding and lookup always agree.
///
/// Handles are owned by the pool; dropping one (through [`release`] or a
/// replacing [`bind`]) closes the source.
///
/// [`release`]: SourcePool::release
/// [`bind`]: SourcePool::bind
pub struct SourcePool<C: Codec> {
    codec: C,
    handles: HashMap<PathBuf, C::Source>,
}

impl<C: Codec> SourcePool<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            handles: HashMap::new(),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Handle for the file `page` belongs to, opening it on first use.
    ///
    /// Open failures are returned unchanged; handles opened earlier stay
    /// pooled until [`SourcePool::release`].
    pub fn get(&mut self, page: &Page, options: &OpenOption) -> Result<&mut C::Source> {
        let file = page.file();
        match self.handles.entry(file.full_name().to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(path = %file.full_name().display(), "Opening source");
                let handle = match file.as_ref() {
                    File::Pdf(pdf) => self.codec.open_pdf(pdf, options)?,
                    File::Image(image) => self.codec.open_image(image, options)?,
                };
                Ok(entry.insert(handle))
            }
        }
    }

    /// Take ownership of an already open `handle` for `key`. A handle
    /// previously bound to the same file is dropped.
    pub fn bind(&mut self, key: impl AsRef<Path>, handle: C::Source) {
        if self.handles.insert(key.as_ref().to_path_buf(), handle).is_some() {
            debug!("Replaced pooled handle");
        }
    }

    /// Drop every pooled handle. Safe to call repeatedly.
    #[instrument(skip_all, fields(handles = self.handles.len()))]
    pub fn release(&mut self) {
        if !self.handles.is_empty() {
            debug!("Releasing pooled sources");
        }
        self.handles.clear();
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.handles.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
