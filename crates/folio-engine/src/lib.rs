// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-engine: assembles output PDFs from pages of many sources.
//
// The engine is codec-agnostic: it drives any `folio_core::Codec`. Pages are
// queued on a `Composer`, and `save` runs a strategy (merge into one file or
// split into one file per page) while a per-save pool keeps each source open
// at most once.

pub mod attachments;
pub mod composer;
pub mod merge;
pub mod persist;
pub mod pool;
pub mod split;

#[cfg(test)]
mod testing;

pub use attachments::AttachmentRegistry;
pub use composer::{Composer, SaveJob, Strategy};
pub use merge::{Merge, Merger};
pub use pool::SourcePool;
pub use split::{Split, Splitter};
