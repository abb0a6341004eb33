// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Source-open failures (raised by the codec, surfaced unchanged) --
    #[error("{} is protected and no password was supplied", path.display())]
    PasswordRequired { path: PathBuf },

    #[error("wrong password for {}", path.display())]
    BadPassword { path: PathBuf },

    #[error("cannot open {}: {reason}", path.display())]
    SourceOpen { path: PathBuf, reason: String },

    /// An encrypted source was opened without owner rights while the caller
    /// asked for full access. The merge strategy translates this into
    /// [`FolioError::EncryptionConflict`].
    #[error("{} was opened without owner rights", path.display())]
    RestrictedSource { path: PathBuf },

    // -- Composition failures --
    #[error("cannot combine {}: {reason}", path.display())]
    EncryptionConflict { path: PathBuf, reason: String },

    #[error("operation cancelled by the user")]
    Cancelled,

    #[error("nothing to save: no pages were added")]
    NothingToSave,

    #[error("another save is already running")]
    Busy,

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("page {number} out of range for {} ({count} pages)", path.display())]
    InvalidPage {
        path: PathBuf,
        number: u32,
        count: u32,
    },

    #[error("rotation must be a multiple of 90, got {0}")]
    InvalidRotation(i32),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("cannot encrypt output: {0}")]
    UnsupportedEncryption(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
