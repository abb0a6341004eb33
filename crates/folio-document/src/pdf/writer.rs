// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-to-PDF synthesis using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use folio_core::Size;
use folio_core::error::{FolioError, Result};

const MM_PER_INCH: f32 = 25.4;
const PT_PER_INCH: f32 = 72.0;

/// Builds PDFs whose pages are raster images shown at their natural size.
pub struct PdfWriter {
    /// Resolution the images are placed at.
    dpi: f32,
    /// Title metadata embedded in the synthesized document.
    title: String,
}

impl PdfWriter {
    /// Create a writer placing images at `dpi`.
    pub fn new(dpi: f32) -> Self {
        Self {
            dpi: if dpi > 0.0 { dpi } else { 96.0 },
            title: String::from("Folio Image"),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Page size in points for an image of `width` x `height` pixels.
    pub fn page_size(&self, width: u32, height: u32) -> Size {
        Size::new(
            width as f32 / self.dpi * PT_PER_INCH,
            height as f32 / self.dpi * PT_PER_INCH,
        )
    }

    /// Create a PDF with one page per frame, each page exactly the size of
    /// its frame at the writer's resolution.
    #[instrument(skip_all, fields(frames = frames.len(), dpi = self.dpi))]
    pub fn create_from_frames(&self, frames: &[DynamicImage]) -> Result<Vec<u8>> {
        if frames.is_empty() {
            return Err(FolioError::Image("image has no frames".into()));
        }

        info!(title = %self.title, "Synthesizing image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(frames.len());

        for frame in frames {
            let width = frame.width() as usize;
            let height = frame.height() as usize;

            // Convert to RGB8 for printpdf.
            let rgb_image = frame.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width,
                height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            let size = self.page_size(frame.width(), frame.height());
            pages.push(PdfPage::new(to_mm(size.width), to_mm(size.height), ops));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }

        debug!(output_bytes = output.len(), "Image PDF synthesized");
        Ok(output)
    }
}

fn to_mm(points: f32) -> Mm {
    Mm(points / PT_PER_INCH * MM_PER_INCH)
}
