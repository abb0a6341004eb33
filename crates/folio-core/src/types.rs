// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provenance model: where every pending page comes from.

use std::ops::Add;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// A page rotation, always one of 0, 90, 180 or 270 degrees (clockwise).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Angle(i32);

impl Angle {
    pub const ZERO: Angle = Angle(0);
    pub const RIGHT: Angle = Angle(90);
    pub const HALF: Angle = Angle(180);
    pub const LEFT: Angle = Angle(270);

    /// Normalise `degrees` into [0, 360). Anything that is not a multiple of
    /// 90 is rejected because PDF `/Rotate` cannot express it.
    pub fn new(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(FolioError::InvalidRotation(degrees));
        }
        Ok(Self(degrees.rem_euclid(360)))
    }

    pub fn degrees(self) -> i32 {
        self.0
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Angle) -> Angle {
        Angle((self.0 + rhs.0).rem_euclid(360))
    }
}

impl TryFrom<i32> for Angle {
    type Error = FolioError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::new(degrees)
    }
}

impl From<Angle> for i32 {
    fn from(angle: Angle) -> i32 {
        angle.0
    }
}

impl std::fmt::Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Horizontal and vertical resolution in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
}

impl Resolution {
    /// PDF user space resolution.
    pub const PDF: Resolution = Resolution { x: 72.0, y: 72.0 };

    pub fn uniform(dpi: f32) -> Self {
        Self { x: dpi, y: dpi }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::PDF
    }
}

/// An existing PDF document on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub full_name: PathBuf,
    pub length: u64,
    pub count: u32,
    pub resolution: Resolution,
    /// Password used to decrypt the document (empty when not encrypted).
    pub password: String,
    /// Whether the document was opened with owner rights.
    pub full_access: bool,
}

/// A raster image on disk. Every frame becomes one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub full_name: PathBuf,
    pub length: u64,
    pub count: u32,
    pub resolution: Resolution,
}

/// The origin of a page. Closed on purpose: the source pool dispatches on it
/// exactly once when it opens a handle.
#[derive(Debug, Clone, PartialEq)]
pub enum File {
    Pdf(PdfFile),
    Image(ImageFile),
}

impl File {
    /// Path of the file; the identity key for pooling.
    pub fn full_name(&self) -> &Path {
        match self {
            Self::Pdf(f) => &f.full_name,
            Self::Image(f) => &f.full_name,
        }
    }

    pub fn length(&self) -> u64 {
        match self {
            Self::Pdf(f) => f.length,
            Self::Image(f) => f.length,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            Self::Pdf(f) => f.count,
            Self::Image(f) => f.count,
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            Self::Pdf(f) => f.resolution,
            Self::Image(f) => f.resolution,
        }
    }

    /// File name without its directory, e.g. `report.pdf`.
    pub fn name(&self) -> String {
        self.full_name()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without directory and extension, e.g. `report`.
    pub fn stem(&self) -> String {
        self.full_name()
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Description of a single page: which file it comes from and how it should
/// be rotated. Holds no open handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    file: Arc<File>,
    number: u32,
    size: Size,
    rotation: Angle,
    delta: Angle,
    resolution: Resolution,
}

impl Page {
    /// Describe page `number` (1-based) of `file`.
    pub fn new(file: Arc<File>, number: u32, size: Size, rotation: Angle) -> Result<Self> {
        let count = file.count();
        if number == 0 || number > count {
            return Err(FolioError::InvalidPage {
                path: file.full_name().to_path_buf(),
                number,
                count,
            });
        }
        let resolution = file.resolution();
        Ok(Self {
            file,
            number,
            size,
            rotation,
            delta: Angle::ZERO,
            resolution,
        })
    }

    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Rotation stored in the source document.
    pub fn rotation(&self) -> Angle {
        self.rotation
    }

    /// Extra rotation requested by the caller.
    pub fn delta(&self) -> Angle {
        self.delta
    }

    pub fn set_delta(&mut self, delta: Angle) {
        self.delta = delta;
    }

    /// Add `angle` on top of the current delta.
    pub fn rotate(&mut self, angle: Angle) {
        self.delta = self.delta + angle;
    }

    /// Rotation written to the output: base rotation plus delta.
    pub fn effective_rotation(&self) -> Angle {
        self.rotation + self.delta
    }

    /// Drop the caller's rotation request.
    pub fn reset(&mut self) {
        self.delta = Angle::ZERO;
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(count: u32) -> Arc<File> {
        Arc::new(File::Pdf(PdfFile {
            full_name: PathBuf::from("/docs/report.pdf"),
            length: 1024,
            count,
            resolution: Resolution::PDF,
            password: String::new(),
            full_access: true,
        }))
    }

    #[test]
    fn angle_normalises_negative_and_large_values() {
        assert_eq!(Angle::new(-90).expect("angle"), Angle::LEFT);
        assert_eq!(Angle::new(450).expect("angle"), Angle::RIGHT);
        assert_eq!(Angle::RIGHT + Angle::LEFT, Angle::ZERO);
    }

    #[test]
    fn angle_rejects_non_right_angles() {
        assert!(matches!(
            Angle::new(45),
            Err(FolioError::InvalidRotation(45))
        ));
    }

    #[test]
    fn page_number_must_be_in_range() {
        let file = pdf(3);
        assert!(Page::new(file.clone(), 0, Size::default(), Angle::ZERO).is_err());
        assert!(Page::new(file.clone(), 4, Size::default(), Angle::ZERO).is_err());
        assert!(Page::new(file, 3, Size::default(), Angle::ZERO).is_ok());
    }

    #[test]
    fn page_reset_only_clears_delta() {
        let mut page = Page::new(pdf(1), 1, Size::new(612.0, 792.0), Angle::HALF).expect("page");
        page.set_delta(Angle::RIGHT);
        assert_eq!(page.effective_rotation(), Angle::LEFT);

        page.reset();
        assert_eq!(page.delta(), Angle::ZERO);
        assert_eq!(page.rotation(), Angle::HALF);
        assert_eq!(page.effective_rotation(), Angle::HALF);
    }

    #[test]
    fn file_name_helpers() {
        let file = pdf(1);
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.stem(), "report");
        assert_eq!(file.full_name(), Path::new("/docs/report.pdf"));
    }
}
