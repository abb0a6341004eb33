// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split strategy: one output file per pending page.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use folio_core::Page;
use folio_core::codec::{Codec, OutputDocument, SourceHandle};
use folio_core::error::Result;

use crate::composer::{Composer, SaveJob, Strategy};
use crate::persist::write_atomically;

/// Writes every pending page to its own PDF inside a directory.
#[derive(Debug, Default, Clone)]
pub struct Split {
    results: Vec<PathBuf>,
}

impl Split {
    /// Files produced by the last save, in page order. Cleared when the next
    /// save starts, so a failed save still lists what it managed to write.
    pub fn results(&self) -> &[PathBuf] {
        &self.results
    }
}

/// A composer that splits.
pub type Splitter<C> = Composer<C, Split>;

impl<C: Codec> Splitter<C> {
    pub fn new(codec: C) -> Self {
        Composer::with_strategy(codec, Split::default())
    }

    pub fn results(&self) -> &[PathBuf] {
        self.strategy().results()
    }
}

impl Strategy for Split {
    #[instrument(skip_all, fields(pages = job.pages.len(), directory = %directory.display()))]
    fn save<C: Codec>(&mut self, mut job: SaveJob<'_, C>, directory: &Path) -> Result<()> {
        self.results.clear();
        let result = self.split(&mut job, directory);
        job.pool.release();
        if result.is_ok() {
            info!(files = self.results.len(), "Split complete");
        }
        result
    }
}

impl Split {
    fn split<C: Codec>(&mut self, job: &mut SaveJob<'_, C>, directory: &Path) -> Result<()> {
        fs::create_dir_all(directory)?;

        for page in job.pages {
            let mut output = job.pool.codec().create_output(job.options)?;
            let handle = job.pool.get(page, &job.options.open)?;
            handle.set_rotation(page.number(), page.effective_rotation())?;
            output.copy_pages(handle, &[page.number()])?;

            let target = unique_path(directory, &file_name(page));
            write_atomically(&target, job.options.temp_directory.as_deref(), |writer| {
                output.finish(writer, job.metadata, job.encryption)
            })?;
            debug!(target = %target.display(), "Page written");
            self.results.push(target);
        }
        Ok(())
    }
}

/// `{stem}-{number}.pdf` with the number zero-padded to the width of the
/// source's page count, and never less than two digits.
pub fn file_name(page: &Page) -> String {
    let file = page.file();
    let width = digits(file.count()).max(2);
    format!("{}-{:0width$}.pdf", file.stem(), page.number(), width = width)
}

fn digits(mut value: u32) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}

/// `directory/name`, or `name (2)`, `name (3)`, … if taken.
fn unique_path(directory: &Path, name: &str) -> PathBuf {
    let candidate = directory.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (2u32..)
        .map(|n| directory.join(format!("{stem} ({n}){extension}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCodec, pages_of, pdf_file, read_lines};
    use folio_core::{Angle, FolioError};

    #[test]
    fn names_are_padded_to_page_count_width() {
        let small = pdf_file("report.pdf", 3);
        let large = pdf_file("/tmp/book.pdf", 120);
        assert_eq!(file_name(&pages_of(&small, &[2])[0]), "report-02.pdf");
        assert_eq!(file_name(&pages_of(&large, &[7])[0]), "book-007.pdf");
        assert_eq!(file_name(&pages_of(&large, &[120])[0]), "book-120.pdf");
    }

    #[test]
    fn digit_counts() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1000), 4);
    }

    #[test]
    fn every_page_gets_a_file_in_order() {
        let codec = FakeCodec::new();
        let stats = codec.stats();
        let mut splitter = Splitter::new(codec);
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("pages");

        let a = pdf_file("a.pdf", 3);
        let mut pages = pages_of(&a, &[3, 1, 2]);
        pages[1].set_delta(Angle::LEFT);
        splitter.add_pages(pages);
        splitter.save(&out).expect("save");

        let names: Vec<String> = splitter
            .results()
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a-03.pdf", "a-01.pdf", "a-02.pdf"]);
        assert_eq!(read_lines(&splitter.results()[1]), vec!["a.pdf:1:270"]);
        assert_eq!(stats.opened(), 1);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn existing_files_get_a_suffix() {
        let mut splitter = Splitter::new(FakeCodec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a-01.pdf"), b"keep").expect("seed");
        fs::write(dir.path().join("a-01 (2).pdf"), b"keep").expect("seed");

        splitter.add_pages(pages_of(&pdf_file("a.pdf", 2), &[1, 1]));
        splitter.save(dir.path()).expect("save");

        assert_eq!(
            splitter.results(),
            &[dir.path().join("a-01 (3).pdf"), dir.path().join("a-01 (4).pdf")]
        );
        assert_eq!(fs::read(dir.path().join("a-01.pdf")).expect("read"), b"keep");
    }

    #[test]
    fn partial_results_survive_failure_until_next_save() {
        let codec = FakeCodec::new();
        let stats = codec.stats();
        stats.fail_open("b.pdf");
        let mut splitter = Splitter::new(codec);
        let dir = tempfile::tempdir().expect("tempdir");

        splitter.add_pages(pages_of(&pdf_file("a.pdf", 1), &[1]));
        splitter.add_pages(pages_of(&pdf_file("b.pdf", 1), &[1]));
        let err = splitter.save(dir.path()).err().expect("fails");
        assert!(matches!(err, FolioError::SourceOpen { .. }));
        assert_eq!(splitter.results().len(), 1);
        assert!(splitter.pages().is_empty());
        assert_eq!(stats.live(), 0);

        splitter.add_pages(pages_of(&pdf_file("c.pdf", 1), &[1]));
        splitter.save(dir.path()).expect("save");
        assert_eq!(splitter.results(), &[dir.path().join("c-01.pdf")]);
    }

    #[test]
    fn empty_split_produces_nothing() {
        let mut splitter = Splitter::new(FakeCodec::new());
        let dir = tempfile::tempdir().expect("tempdir");
        splitter.save(dir.path()).expect("save");
        assert!(splitter.results().is_empty());
    }
}
