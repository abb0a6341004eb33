// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: opening sources, synthesizing image pages, and writing outputs.

pub(crate) mod objects;
pub mod output;
pub mod reader;
pub mod writer;

pub use output::LopdfOutput;
pub use reader::LopdfSource;
pub use writer::PdfWriter;
