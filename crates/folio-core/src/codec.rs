// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Codec boundary. The composition engine never parses or writes PDF bytes
// itself; it drives an implementation of these traits.

use std::io::Write;
use std::path::Path;

use crate::attachment::Attachment;
use crate::config::{OpenOption, SaveOption};
use crate::error::Result;
use crate::metadata::{Encryption, Metadata};
use crate::types::{Angle, ImageFile, PdfFile};

/// Opens sources and creates outputs.
pub trait Codec {
    /// An open source document. Dropping it releases everything it holds.
    type Source: SourceHandle;
    /// An in-progress output document.
    type Output: OutputDocument<Source = Self::Source>;

    /// Open (and decrypt, using `file.password`) an existing PDF.
    ///
    /// Fails with `PasswordRequired`, `BadPassword` or `SourceOpen`. A
    /// document opened with user rights only still opens; outputs that need
    /// full access refuse to copy from it with `RestrictedSource`.
    fn open_pdf(&self, file: &PdfFile, options: &OpenOption) -> Result<Self::Source>;

    /// Synthesize an in-memory PDF with one page per image frame.
    fn open_image(&self, file: &ImageFile, options: &OpenOption) -> Result<Self::Source>;

    /// Start a new, empty output document.
    fn create_output(&self, options: &SaveOption) -> Result<Self::Output>;
}

/// An open source document.
pub trait SourceHandle {
    /// Path the handle was opened from.
    fn path(&self) -> &Path;

    fn page_count(&self) -> u32;

    /// Set the rotation stored on page `number` (1-based) before it is copied.
    fn set_rotation(&mut self, number: u32, angle: Angle) -> Result<()>;

    /// Attachments embedded in the source. Sources without any return an
    /// empty list.
    fn attachments(&self) -> Result<Vec<Attachment>>;
}

/// An output document under construction.
pub trait OutputDocument {
    type Source: SourceHandle;

    /// Append pages `numbers` (1-based, in the given order) of `source`.
    fn copy_pages(&mut self, source: &Self::Source, numbers: &[u32]) -> Result<()>;

    /// Embed `attachment` as a file attachment of the output.
    fn embed_attachment(&mut self, attachment: &Attachment) -> Result<()>;

    /// Number of pages appended so far.
    fn page_count(&self) -> usize;

    /// Apply metadata and encryption and serialise the document to `writer`.
    fn finish(
        self,
        writer: &mut dyn Write,
        metadata: &Metadata,
        encryption: &Encryption,
    ) -> Result<()>;
}

/// Asked for a password when a source needs one.
pub trait PasswordQuery {
    /// Return the password for `path`, or `None` if the user declined.
    /// `retry` is true when a previous answer was wrong.
    fn password(&self, path: &Path, retry: bool) -> Option<String>;
}

/// A [`PasswordQuery`] that always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPassword;

impl PasswordQuery for NoPassword {
    fn password(&self, _path: &Path, _retry: bool) -> Option<String> {
        None
    }
}
