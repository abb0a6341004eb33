// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `lopdf`-backed implementation of the codec boundary.

use std::path::Path;

use tracing::{debug, instrument};

use folio_core::codec::{Codec, SourceHandle};
use folio_core::config::{OpenOption, SaveOption};
use folio_core::error::{FolioError, Result};
use folio_core::{ImageFile, PdfFile};

use crate::image::processor::RasterImage;
use crate::pdf::output::LopdfOutput;
use crate::pdf::reader::LopdfSource;
use crate::pdf::writer::PdfWriter;

/// Opens sources with `lopdf`, synthesizes image pages with `printpdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec;

impl LopdfCodec {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize the in-memory PDF standing in for a decoded image, one
    /// page per frame at `dpi`.
    pub(crate) fn synthesize(path: &Path, raster: &RasterImage, dpi: f32) -> Result<LopdfSource> {
        let mut writer = PdfWriter::new(dpi);
        writer.set_title(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let bytes = writer.create_from_frames(raster.frames())?;
        LopdfSource::from_bytes(path.to_path_buf(), &bytes)
    }
}

impl Codec for LopdfCodec {
    type Source = LopdfSource;
    type Output = LopdfOutput;

    #[instrument(skip_all, fields(path = %file.full_name.display()))]
    fn open_pdf(&self, file: &PdfFile, options: &OpenOption) -> Result<LopdfSource> {
        LopdfSource::open(&file.full_name, &file.password, options)
    }

    #[instrument(skip_all, fields(path = %file.full_name.display(), dpi = file.resolution.x))]
    fn open_image(&self, file: &ImageFile, _options: &OpenOption) -> Result<LopdfSource> {
        let raster = RasterImage::open(&file.full_name)?;
        let source = Self::synthesize(&file.full_name, &raster, file.resolution.x)?;
        if source.page_count() != file.count {
            return Err(FolioError::SourceOpen {
                path: file.full_name.clone(),
                reason: format!(
                    "image has {} frames, expected {}",
                    source.page_count(),
                    file.count
                ),
            });
        }
        debug!(pages = file.count, "Image source synthesized");
        Ok(source)
    }

    fn create_output(&self, options: &SaveOption) -> Result<LopdfOutput> {
        Ok(LopdfOutput::new(options))
    }
}
