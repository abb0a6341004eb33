// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attachment registry: keeps the first of every group of identical
// attachments.

use tracing::debug;

use folio_core::Attachment;
use folio_core::error::Result;

/// Accepted attachments, in the order they were first seen.
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    accepted: Vec<Attachment>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `attachment` unless one with the same name (ignoring case),
    /// length and checksum is already registered. Returns whether it was
    /// accepted.
    ///
    /// Checksums are only computed for candidates whose name and length
    /// already match.
    pub fn add(&mut self, attachment: Attachment) -> Result<bool> {
        for existing in &self.accepted {
            if existing.same_identity(&attachment)? {
                debug!(
                    name = %attachment.name(),
                    checksum = %attachment.checksum_hex()?,
                    "Discarding duplicate attachment"
                );
                return Ok(false);
            }
        }
        self.accepted.push(attachment);
        Ok(true)
    }

    /// Add every item of `attachments`, returning how many were accepted.
    pub fn extend(&mut self, attachments: impl IntoIterator<Item = Attachment>) -> Result<usize> {
        let mut added = 0;
        for attachment in attachments {
            if self.add(attachment)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.accepted.iter()
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}
