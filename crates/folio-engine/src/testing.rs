// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory codec double that counts opens and drops and writes a plain-text
// listing of the pages it was asked to copy.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use folio_core::codec::{Codec, OutputDocument, SourceHandle};
use folio_core::config::{OpenOption, SaveOption};
use folio_core::error::{FolioError, Result};
use folio_core::{
    Angle, Attachment, Encryption, File, ImageFile, Metadata, Page, PdfFile, Resolution, Size,
};

#[derive(Default)]
pub(crate) struct Stats {
    opened: Cell<usize>,
    created: Cell<usize>,
    dropped: Cell<usize>,
    failing: RefCell<HashSet<PathBuf>>,
    restricted: RefCell<HashSet<PathBuf>>,
    embedded: RefCell<HashMap<PathBuf, Vec<Attachment>>>,
}

impl Stats {
    /// Sources opened through the codec.
    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }

    /// Sources created and not yet dropped.
    pub fn live(&self) -> usize {
        self.created.get() - self.dropped.get()
    }

    pub fn fail_open(&self, path: &str) {
        self.failing.borrow_mut().insert(PathBuf::from(path));
    }

    pub fn restrict(&self, path: &str) {
        self.restricted.borrow_mut().insert(PathBuf::from(path));
    }

    pub fn embed(&self, path: &str, attachments: Vec<Attachment>) {
        self.embedded
            .borrow_mut()
            .insert(PathBuf::from(path), attachments);
    }
}

pub(crate) struct FakeCodec {
    stats: Rc<Stats>,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self {
            stats: Rc::new(Stats::default()),
        }
    }

    pub fn stats(&self) -> Rc<Stats> {
        Rc::clone(&self.stats)
    }

    /// A handle created outside the pool, as a document reader would.
    pub fn source(&self, path: &str, count: u32) -> FakeSource {
        self.make(Path::new(path), count)
    }

    fn make(&self, path: &Path, count: u32) -> FakeSource {
        self.stats.created.set(self.stats.created.get() + 1);
        FakeSource {
            path: path.to_path_buf(),
            count,
            rotations: HashMap::new(),
            stats: Rc::clone(&self.stats),
        }
    }

    fn open(&self, path: &Path, count: u32) -> Result<FakeSource> {
        if self.stats.failing.borrow().contains(path) {
            return Err(FolioError::SourceOpen {
                path: path.to_path_buf(),
                reason: "induced failure".into(),
            });
        }
        self.stats.opened.set(self.stats.opened.get() + 1);
        Ok(self.make(path, count))
    }
}

impl Codec for FakeCodec {
    type Source = FakeSource;
    type Output = FakeOutput;

    fn open_pdf(&self, file: &PdfFile, _options: &OpenOption) -> Result<FakeSource> {
        self.open(&file.full_name, file.count)
    }

    fn open_image(&self, file: &ImageFile, _options: &OpenOption) -> Result<FakeSource> {
        self.open(&file.full_name, file.count)
    }

    fn create_output(&self, _options: &SaveOption) -> Result<FakeOutput> {
        Ok(FakeOutput {
            stats: Rc::clone(&self.stats),
            lines: Vec::new(),
        })
    }
}

pub(crate) struct FakeSource {
    path: PathBuf,
    count: u32,
    rotations: HashMap<u32, Angle>,
    stats: Rc<Stats>,
}

impl SourceHandle for FakeSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn page_count(&self) -> u32 {
        self.count
    }

    fn set_rotation(&mut self, number: u32, angle: Angle) -> Result<()> {
        self.rotations.insert(number, angle);
        Ok(())
    }

    fn attachments(&self) -> Result<Vec<Attachment>> {
        Ok(self
            .stats
            .embedded
            .borrow()
            .get(&self.path)
            .cloned()
            .unwrap_or_default())
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.stats.dropped.set(self.stats.dropped.get() + 1);
    }
}

/// Writes one line per copied page (`name:number:degrees`) and per embedded
/// attachment (`attach:name`).
pub(crate) struct FakeOutput {
    stats: Rc<Stats>,
    lines: Vec<String>,
}

impl OutputDocument for FakeOutput {
    type Source = FakeSource;

    fn copy_pages(&mut self, source: &FakeSource, numbers: &[u32]) -> Result<()> {
        if self.stats.restricted.borrow().contains(&source.path) {
            return Err(FolioError::RestrictedSource {
                path: source.path.clone(),
            });
        }
        for &number in numbers {
            if number == 0 || number > source.count {
                return Err(FolioError::InvalidPage {
                    path: source.path.clone(),
                    number,
                    count: source.count,
                });
            }
            let angle = source.rotations.get(&number).copied().unwrap_or_default();
            self.lines.push(format!(
                "{}:{}:{}",
                source.path.display(),
                number,
                angle.degrees()
            ));
        }
        Ok(())
    }

    fn embed_attachment(&mut self, attachment: &Attachment) -> Result<()> {
        self.lines.push(format!("attach:{}", attachment.name()));
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.starts_with("attach:")).count()
    }

    fn finish(
        self,
        writer: &mut dyn Write,
        metadata: &Metadata,
        _encryption: &Encryption,
    ) -> Result<()> {
        for line in &self.lines {
            writeln!(writer, "{line}")?;
        }
        if !metadata.title.is_empty() {
            writeln!(writer, "title:{}", metadata.title)?;
        }
        Ok(())
    }
}

pub(crate) fn pdf_file(name: &str, count: u32) -> Arc<File> {
    Arc::new(File::Pdf(PdfFile {
        full_name: PathBuf::from(name),
        length: 1024,
        count,
        resolution: Resolution::PDF,
        password: String::new(),
        full_access: true,
    }))
}

pub(crate) fn image_file(name: &str, count: u32) -> Arc<File> {
    Arc::new(File::Image(ImageFile {
        full_name: PathBuf::from(name),
        length: 2048,
        count,
        resolution: Resolution::uniform(96.0),
    }))
}

pub(crate) fn pages_of(file: &Arc<File>, numbers: &[u32]) -> Vec<Page> {
    numbers
        .iter()
        .map(|&n| {
            Page::new(Arc::clone(file), n, Size::new(612.0, 792.0), Angle::ZERO).expect("page")
        })
        .collect()
}

pub(crate) fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(str::to_string)
        .collect()
}
