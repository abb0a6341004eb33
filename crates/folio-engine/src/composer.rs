// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composition engine: pending pages, attachments, metadata and encryption,
// plus the source pool lifecycle around one save.

use std::path::Path;

use tracing::{info, instrument, warn};

use folio_core::codec::Codec;
use folio_core::config::SaveOption;
use folio_core::error::Result;
use folio_core::{Attachment, Encryption, Metadata, Page};

use crate::pool::SourcePool;

/// Everything a strategy needs for one save. Borrowed from the composer for
/// the duration of [`Composer::save`].
pub struct SaveJob<'a, C: Codec> {
    pub pool: &'a mut SourcePool<C>,
    pub pages: &'a [Page],
    pub attachments: &'a [Attachment],
    pub metadata: &'a Metadata,
    pub encryption: &'a Encryption,
    pub options: &'a SaveOption,
}

/// How pending pages are turned into output files.
pub trait Strategy {
    /// Produce the output(s) for `job` at `destination`. Pool release is the
    /// strategy's last step, on success and on failure.
    fn save<C: Codec>(&mut self, job: SaveJob<'_, C>, destination: &Path) -> Result<()>;
}

/// The composition engine, parameterised by codec and output strategy.
///
/// Not meant to be shared between threads: one caller adds pages and saves.
pub struct Composer<C: Codec, S> {
    pool: SourcePool<C>,
    pages: Vec<Page>,
    attachments: Vec<Attachment>,
    metadata: Metadata,
    encryption: Encryption,
    options: SaveOption,
    strategy: S,
}

impl<C: Codec, S: Strategy> Composer<C, S> {
    pub fn with_strategy(codec: C, strategy: S) -> Self {
        Self {
            pool: SourcePool::new(codec),
            pages: Vec::new(),
            attachments: Vec::new(),
            metadata: Metadata::default(),
            encryption: Encryption::default(),
            options: SaveOption::default(),
            strategy,
        }
    }

    // -- Pending state --------------------------------------------------------

    /// Append `pages` in the given order. Repeats are kept.
    pub fn add_pages(&mut self, pages: impl IntoIterator<Item = Page>) {
        self.pages.extend(pages);
    }

    /// Append `pages` and hand over the already open `handle` they were read
    /// from, so the save does not open the source again.
    pub fn add_pages_with_source(&mut self, pages: Vec<Page>, handle: C::Source) {
        match pages.first() {
            Some(first) => self.pool.bind(first.file().full_name(), handle),
            None => warn!("No pages given with source, dropping handle"),
        }
        self.pages.extend(pages);
    }

    /// Queue attachments; duplicates are removed at save time.
    pub fn add_attachments(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.attachments.extend(attachments);
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    pub fn set_encryption(&mut self, encryption: Encryption) {
        self.encryption = encryption;
    }

    /// Options used by every later save. Not affected by [`Composer::reset`].
    pub fn set_options(&mut self, options: SaveOption) {
        self.options = options;
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn encryption(&self) -> &Encryption {
        &self.encryption
    }

    pub fn options(&self) -> &SaveOption {
        &self.options
    }

    pub fn pool(&self) -> &SourcePool<C> {
        &self.pool
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    // -- Save -----------------------------------------------------------------

    /// Write the pending pages to `destination` with the configured
    /// strategy. The composer is reset afterwards whether or not the save
    /// succeeded.
    #[instrument(skip_all, fields(destination = %destination.as_ref().display(), pages = self.pages.len()))]
    pub fn save(&mut self, destination: impl AsRef<Path>) -> Result<()> {
        let job = SaveJob {
            pool: &mut self.pool,
            pages: &self.pages,
            attachments: &self.attachments,
            metadata: &self.metadata,
            encryption: &self.encryption,
            options: &self.options,
        };
        let result = self.strategy.save(job, destination.as_ref());
        self.reset();

        match &result {
            Ok(()) => info!("Save complete"),
            Err(err) => warn!(error = %err, "Save failed"),
        }
        result
    }

    /// Drop all pending state and close every pooled source.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.attachments.clear();
        self.metadata = Metadata::default();
        self.encryption = Encryption::default();
        self.pool.release();
    }
}
