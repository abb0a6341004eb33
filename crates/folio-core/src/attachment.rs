// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attachments: files embedded into an output PDF, identified by
// (name, length, SHA-256 checksum).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{FolioError, Result};

/// Length of an attachment checksum in bytes (SHA-256).
pub const CHECKSUM_LEN: usize = 32;

/// A file to be embedded into an output document.
///
/// Attachments are immutable once built. The payload of a filesystem-backed
/// attachment is read on first use, and the checksum is computed from the
/// payload on first use, so attachments that are rejected by name or length
/// never touch the disk.
#[derive(Clone)]
pub struct Attachment {
    name: String,
    /// Originating path; empty when the data came from an embedded stream.
    source: PathBuf,
    length: u64,
    data: OnceLock<Vec<u8>>,
    checksum: OnceLock<[u8; CHECKSUM_LEN]>,
}

impl Attachment {
    /// Reference a file on disk. Only its metadata is read here.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                FolioError::UnsupportedDocument(format!("{} has no file name", path.display()))
            })?;
        Ok(Self {
            name,
            source: path.to_path_buf(),
            length: meta.len(),
            data: OnceLock::new(),
            checksum: OnceLock::new(),
        })
    }

    /// Wrap an already decoded payload, e.g. one extracted from a PDF.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: PathBuf::new(),
            length: data.len() as u64,
            data: OnceLock::from(data),
            checksum: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// The payload, read from [`Attachment::source`] on first access.
    pub fn data(&self) -> Result<&[u8]> {
        if self.data.get().is_none() {
            debug!(path = %self.source.display(), "Reading attachment payload");
            let bytes = std::fs::read(&self.source)?;
            // A concurrent initialiser would have stored identical bytes.
            let _ = self.data.set(bytes);
        }
        self.data
            .get()
            .map(Vec::as_slice)
            .ok_or_else(|| FolioError::Pdf(format!("attachment {} has no payload", self.name)))
    }

    /// SHA-256 of the payload, computed on first access.
    pub fn checksum(&self) -> Result<&[u8; CHECKSUM_LEN]> {
        if self.checksum.get().is_none() {
            let digest: [u8; CHECKSUM_LEN] = Sha256::digest(self.data()?).into();
            let _ = self.checksum.set(digest);
        }
        self.checksum
            .get()
            .ok_or_else(|| FolioError::Pdf(format!("attachment {} has no checksum", self.name)))
    }

    /// Lowercase hex form of [`Attachment::checksum`].
    pub fn checksum_hex(&self) -> Result<String> {
        Ok(hex::encode(self.checksum()?))
    }

    /// Whether both attachments have the same dedup identity: name (ignoring
    /// case), length and checksum. Checksums are only computed when the
    /// cheaper fields already match.
    pub fn same_identity(&self, other: &Attachment) -> Result<bool> {
        if self.length != other.length || !same_name(&self.name, &other.name) {
            return Ok(false);
        }
        Ok(self.checksum()? == other.checksum()?)
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("length", &self.length)
            .field("loaded", &self.data.get().is_some())
            .finish()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
