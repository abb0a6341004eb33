// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster sources: decode an image file into the frames that become pages.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use tracing::{info, instrument};

use folio_core::error::{FolioError, Result};

/// A decoded raster image. Animated GIFs yield one frame per animation frame;
/// every other format yields a single frame.
pub struct RasterImage {
    frames: Vec<DynamicImage>,
}

impl RasterImage {
    // -- Construction ---------------------------------------------------------

    /// Decode the image at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path).map_err(|err| {
            FolioError::UnsupportedDocument(format!("{}: {}", path.display(), err))
        })?;

        let frames = if format == ImageFormat::Gif {
            let reader = BufReader::new(File::open(path)?);
            let decoder = GifDecoder::new(reader).map_err(|err| image_error(path, err))?;
            decoder
                .into_frames()
                .collect_frames()
                .map_err(|err| image_error(path, err))?
                .into_iter()
                .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()))
                .collect()
        } else {
            vec![image::open(path).map_err(|err| image_error(path, err))?]
        };

        info!(?format, frames = frames.len(), "Image loaded");
        Ok(Self { frames })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[DynamicImage] {
        &self.frames
    }
}

fn image_error(path: &Path, err: image::ImageError) -> FolioError {
    FolioError::SourceOpen {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
