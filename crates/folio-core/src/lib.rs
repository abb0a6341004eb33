// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: provenance model, codec boundary, options and errors shared across
// all crates.

pub mod attachment;
pub mod codec;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod metadata;
pub mod types;

pub use attachment::Attachment;
pub use codec::{Codec, NoPassword, OutputDocument, PasswordQuery, SourceHandle};
pub use config::{OpenOption, SaveOption};
pub use error::{FolioError, Result};
pub use metadata::{
    Encryption, EncryptionMethod, Metadata, PageLayout, PageMode, PdfVersion, Permission,
};
pub use types::*;
