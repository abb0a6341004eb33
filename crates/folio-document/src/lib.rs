// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document: the lopdf/printpdf codec behind the Folio composition
// engine.
//
// Provides the PDF source handle (decrypt, page geometry, embedded files),
// image-to-PDF synthesis, the output writer (page copy, attachments,
// metadata, encryption) and the document reader used to describe new
// sources as pages.

pub mod codec;
pub mod document;
pub mod image;
pub mod pdf;

pub use codec::LopdfCodec;
pub use document::{DocumentReader, OpenedDocument};
pub use image::processor::RasterImage;
pub use pdf::output::LopdfOutput;
pub use pdf::reader::LopdfSource;
pub use pdf::writer::PdfWriter;
