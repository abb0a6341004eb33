// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a host presents it.

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user cancelled; nothing should be shown.
    Silent,
    /// Busy or a temporary filesystem problem; trying again may work.
    Transient,
    /// User must do something (enter a password, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying: damaged file, unsupported format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether trying the same request again can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: severity == Severity::Transient,
            severity,
        }
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::PasswordRequired { path } => HumanError::new(
            format!("{} is password protected.", file_label(path)),
            "Enter the document's password and try again.",
            Severity::ActionRequired,
        ),

        FolioError::BadPassword { path } => HumanError::new(
            format!("The password for {} is wrong.", file_label(path)),
            "Check the password (it is case-sensitive) and try again.",
            Severity::ActionRequired,
        ),

        FolioError::SourceOpen { path, .. } => HumanError::new(
            format!("{} couldn't be opened.", file_label(path)),
            "The file may be damaged or not a real PDF or image. Try opening it in another program first.",
            Severity::Permanent,
        ),

        FolioError::RestrictedSource { path } | FolioError::EncryptionConflict { path, .. } => {
            HumanError::new(
                format!("{} is protected against changes.", file_label(path)),
                "Enter the owner password of that document to combine it with others.",
                Severity::ActionRequired,
            )
        }

        FolioError::Cancelled => HumanError::new(
            "Cancelled.",
            "",
            Severity::Silent,
        ),

        FolioError::NothingToSave => HumanError::new(
            "There are no pages to save.",
            "Add at least one document or page first.",
            Severity::ActionRequired,
        ),

        FolioError::Busy => HumanError::new(
            "Another file is still being saved.",
            "Wait until it has finished, then try again.",
            Severity::Transient,
        ),

        FolioError::Pdf(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged. Try opening it on a computer first to check it works, or try a different file.",
            Severity::Permanent,
        ),

        FolioError::Image(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            Severity::Permanent,
        ),

        FolioError::InvalidPage { number, count, .. } => HumanError::new(
            format!("Page {number} doesn't exist."),
            format!("The document only has {count} pages."),
            Severity::ActionRequired,
        ),

        FolioError::InvalidRotation(degrees) => HumanError::new(
            format!("Pages can't be turned by {degrees} degrees."),
            "Use 90, 180 or 270 degrees.",
            Severity::ActionRequired,
        ),

        FolioError::UnsupportedDocument(detail) => HumanError::new(
            "This type of document isn't supported.",
            format!("Only PDF files and common image formats can be used. ({detail})"),
            Severity::Permanent,
        ),

        FolioError::UnsupportedEncryption(detail) => HumanError::new(
            format!("The output couldn't be encrypted ({detail})."),
            "Check the passwords or choose a different encryption method.",
            Severity::ActionRequired,
        ),

        FolioError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "The app doesn't have permission to use that file or folder.",
                "Check the permissions, or choose a different location.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your disk may be full.",
                Severity::Transient,
            ),
        },

        FolioError::Serialization(_) => HumanError::new(
            "The settings file couldn't be read.",
            "Check that it is valid JSON, or remove it to use the defaults.",
            Severity::ActionRequired,
        ),
    }
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| format!("\"{}\"", n.to_string_lossy()))
        .unwrap_or_else(|| "The document".into())
}
