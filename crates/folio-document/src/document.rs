// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document reader: turns a path into a described File, its Pages, its
// embedded attachments and the open handle that produced them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use folio_core::codec::{PasswordQuery, SourceHandle};
use folio_core::config::OpenOption;
use folio_core::error::{FolioError, Result};
use folio_core::{Attachment, File, ImageFile, Page, PdfFile, Resolution};

use crate::codec::LopdfCodec;
use crate::image::processor::RasterImage;
use crate::pdf::reader::LopdfSource;

/// Everything learned from opening one source.
#[derive(Debug)]
pub struct OpenedDocument {
    pub file: Arc<File>,
    /// Every page of the file, in document order.
    pub pages: Vec<Page>,
    /// Files embedded in the source (always empty for images).
    pub attachments: Vec<Attachment>,
    /// The handle the description was read from. Hand it to the engine
    /// together with the pages so the source is not parsed twice.
    pub source: LopdfSource,
}

/// Opens PDFs and images and describes them as pages.
pub struct DocumentReader;

impl DocumentReader {
    /// Open `path`. PDFs are recognised by their `.pdf` extension; anything
    /// else must be an image format the `image` crate can decode.
    ///
    /// Encrypted PDFs are tried with an empty password, then `password`, then
    /// whatever `query` supplies until it declines.
    ///
    /// The described file carries the canonical path, which is also the key
    /// its pages are pooled under.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        password: &str,
        options: &OpenOption,
        query: &dyn PasswordQuery,
    ) -> Result<OpenedDocument> {
        let path = canonical(path.as_ref());
        let path = path.as_path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        let opened = if is_pdf {
            Self::open_pdf(path, password, options, query)?
        } else {
            Self::open_image(path, options)?
        };
        info!(
            pages = opened.pages.len(),
            attachments = opened.attachments.len(),
            "Document opened"
        );
        Ok(opened)
    }

    fn open_pdf(
        path: &Path,
        password: &str,
        options: &OpenOption,
        query: &dyn PasswordQuery,
    ) -> Result<OpenedDocument> {
        let (source, used) = Self::unlock(path, password, options, query)?;
        let length = std::fs::metadata(path)?.len();

        let file = Arc::new(File::Pdf(PdfFile {
            full_name: path.to_path_buf(),
            length,
            count: source.page_count(),
            resolution: Resolution::PDF,
            password: used,
            full_access: source.full_access(),
        }));
        let pages = describe_pages(&file, &source)?;
        let attachments = source.attachments()?;

        Ok(OpenedDocument {
            file,
            pages,
            attachments,
            source,
        })
    }

    /// Find a password that opens `path` with the rights `options` asks for.
    fn unlock(
        path: &Path,
        password: &str,
        options: &OpenOption,
        query: &dyn PasswordQuery,
    ) -> Result<(LopdfSource, String)> {
        let sufficient = |source: &LopdfSource| source.full_access() || !options.full_access;

        match LopdfSource::open(path, "", options) {
            Ok(source) if sufficient(&source) => return Ok((source, String::new())),
            Ok(_) => debug!("Opened with user rights only, owner password needed"),
            Err(FolioError::PasswordRequired { .. }) => {}
            Err(err) => return Err(err),
        }

        let mut retry = false;
        if !password.is_empty() {
            match LopdfSource::open(path, password, options) {
                Ok(source) if sufficient(&source) => return Ok((source, password.to_string())),
                Ok(_) => {
                    debug!("Supplied password grants user rights only");
                    retry = true;
                }
                Err(FolioError::BadPassword { .. }) => retry = true,
                Err(err) => return Err(err),
            }
        }

        loop {
            let Some(candidate) = query.password(path, retry) else {
                info!("Password request declined");
                return Err(FolioError::Cancelled);
            };
            match LopdfSource::open(path, &candidate, options) {
                Ok(source) if sufficient(&source) => return Ok((source, candidate)),
                Ok(_) | Err(FolioError::BadPassword { .. } | FolioError::PasswordRequired { .. }) => {
                    warn!("Password rejected");
                    retry = true;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn open_image(path: &Path, options: &OpenOption) -> Result<OpenedDocument> {
        let raster = RasterImage::open(path)?;
        let length = std::fs::metadata(path)?.len();
        let resolution = Resolution::uniform(options.image_dpi);

        let source = LopdfCodec::synthesize(path, &raster, resolution.x)?;
        let file = Arc::new(File::Image(ImageFile {
            full_name: path.to_path_buf(),
            length,
            count: raster.frame_count() as u32,
            resolution,
        }));
        let pages = describe_pages(&file, &source)?;

        Ok(OpenedDocument {
            file,
            pages,
            attachments: Vec::new(),
            source,
        })
    }
}

/// The canonical form of `path`, or `path` itself when it does not resolve.
/// Opening then fails with the I/O error for the name the caller gave.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn describe_pages(file: &Arc<File>, source: &LopdfSource) -> Result<Vec<Page>> {
    (1..=file.count())
        .map(|number| {
            Page::new(
                Arc::clone(file),
                number,
                source.page_size(number)?,
                source.page_rotation(number)?,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;

    use folio_core::codec::{NoPassword, OutputDocument};
    use folio_core::config::SaveOption;
    use folio_core::{Angle, Encryption, EncryptionMethod, Metadata};
    use image::{Rgb, RgbImage};
    use lopdf::{Document, Object, Stream, dictionary};

    use super::*;
    use crate::pdf::output::LopdfOutput;

    /// Write an A4 PDF with `count` pages; the page tree carries /Rotate 90.
    fn sample_pdf(path: &Path, count: u32) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (1..=count)
            .map(|n| {
                let content = Stream::new(
                    lopdf::Dictionary::new(),
                    format!("BT 72 720 Td (Page {n}) Tj ET").into_bytes(),
                );
                let content_id = doc.add_object(content);
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Rotate" => 90,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save sample pdf");
    }

    /// Re-write `input` through the output writer, with `attachment` and
    /// `encryption` applied.
    fn rewrite(input: &Path, output: &Path, attachment: Option<Attachment>, encryption: Encryption) {
        let options = SaveOption::default();
        let source = LopdfSource::open(input, "", &options.open).expect("open input");
        let mut out = LopdfOutput::new(&options);
        let numbers: Vec<u32> = (1..=source.page_count()).collect();
        out.copy_pages(&source, &numbers).expect("copy");
        if let Some(attachment) = attachment {
            out.embed_attachment(&attachment).expect("embed");
        }
        let mut file = std::fs::File::create(output).expect("create");
        out.finish(&mut file, &Metadata::default(), &encryption)
            .expect("finish");
    }

    struct Answers {
        answers: Vec<&'static str>,
        asked: Cell<usize>,
        saw_retry: Cell<bool>,
    }

    impl PasswordQuery for Answers {
        fn password(&self, _path: &Path, retry: bool) -> Option<String> {
            let index = self.asked.get();
            self.asked.set(index + 1);
            if retry {
                self.saw_retry.set(true);
            }
            self.answers.get(index).map(|a| a.to_string())
        }
    }

    fn encrypted_fixture(dir: &Path) -> PathBuf {
        let plain = dir.join("plain.pdf");
        let locked = dir.join("locked.pdf");
        sample_pdf(&plain, 2);
        rewrite(
            &plain,
            &locked,
            None,
            Encryption {
                enabled: true,
                method: EncryptionMethod::Standard128,
                owner_password: "owner".into(),
                user_password: "user".into(),
                open_with_password: true,
                ..Encryption::default()
            },
        );
        locked
    }

    #[test]
    fn pdf_pages_inherit_geometry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.pdf");
        sample_pdf(&path, 3);

        let opened =
            DocumentReader::open(&path, "", &OpenOption::default(), &NoPassword).expect("open");
        assert_eq!(opened.file.count(), 3);
        assert_eq!(opened.pages.len(), 3);
        let first = &opened.pages[0];
        assert_eq!(first.number(), 1);
        assert_eq!(first.rotation(), Angle::RIGHT);
        assert!((first.size().width - 595.0).abs() < 0.01);
        assert!((first.size().height - 842.0).abs() < 0.01);
        assert!(opened.attachments.is_empty());
        assert_eq!(opened.source.page_count(), 3);
    }

    #[test]
    fn embedded_files_are_extracted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plain = dir.path().join("plain.pdf");
        let with_file = dir.path().join("with-file.pdf");
        sample_pdf(&plain, 1);
        rewrite(
            &plain,
            &with_file,
            Some(Attachment::from_bytes("notes.txt", b"hello folio".to_vec())),
            Encryption::default(),
        );

        let opened = DocumentReader::open(&with_file, "", &OpenOption::default(), &NoPassword)
            .expect("open");
        assert_eq!(opened.attachments.len(), 1);
        let attachment = &opened.attachments[0];
        assert_eq!(attachment.name(), "notes.txt");
        assert_eq!(attachment.data().expect("data"), b"hello folio");
    }

    #[test]
    fn file_carries_the_canonical_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
        sample_pdf(&dir.path().join("a.pdf"), 1);
        let roundabout = dir.path().join("sub").join("..").join("a.pdf");

        let opened = DocumentReader::open(&roundabout, "", &OpenOption::default(), &NoPassword)
            .expect("open");
        let expected = std::fs::canonicalize(dir.path().join("a.pdf")).expect("canonicalize");
        assert_eq!(opened.file.full_name(), expected.as_path());
        assert_eq!(opened.pages[0].file().full_name(), expected.as_path());
    }

    #[test]
    fn images_become_one_page_per_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("image.png");
        RgbImage::from_pixel(192, 96, Rgb([10, 20, 30]))
            .save(&path)
            .expect("save png");

        let options = OpenOption {
            image_dpi: 96.0,
            ..OpenOption::default()
        };
        let opened = DocumentReader::open(&path, "", &options, &NoPassword).expect("open");
        assert!(matches!(opened.file.as_ref(), File::Image(_)));
        assert_eq!(opened.pages.len(), 1);
        let size = opened.pages[0].size();
        assert!((size.width - 144.0).abs() < 0.5);
        assert!((size.height - 72.0).abs() < 0.5);
    }

    #[test]
    fn declined_password_is_cancelled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locked = encrypted_fixture(dir.path());
        let err = DocumentReader::open(&locked, "", &OpenOption::default(), &NoPassword)
            .err()
            .expect("should fail");
        assert!(matches!(err, FolioError::Cancelled));
    }

    fn page_text(source: &LopdfSource, number: u32) -> String {
        let page_id = source.page_id(number).expect("page id");
        let content = source
            .document()
            .get_page_content(page_id)
            .expect("page content");
        String::from_utf8_lossy(&content).into_owned()
    }

    #[test]
    fn user_password_opens_with_user_rights() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locked = encrypted_fixture(dir.path());
        let options = OpenOption {
            full_access: false,
            ..OpenOption::default()
        };
        let opened = DocumentReader::open(&locked, "user", &options, &NoPassword).expect("open");
        assert_eq!(opened.pages.len(), 2);
        assert!(page_text(&opened.source, 2).contains("(Page 2)"));
        match opened.file.as_ref() {
            File::Pdf(pdf) => {
                assert_eq!(pdf.count, 2);
                assert_eq!(pdf.password, "user");
                assert!(!pdf.full_access);
            }
            other => panic!("unexpected file: {other:?}"),
        }
    }

    #[test]
    fn owner_password_grants_full_access() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locked = encrypted_fixture(dir.path());
        let opened = DocumentReader::open(&locked, "owner", &OpenOption::default(), &NoPassword)
            .expect("open");
        assert_eq!(opened.pages.len(), 2);
        assert!(opened.source.full_access());
        assert!(page_text(&opened.source, 1).contains("(Page 1)"));
    }

    #[test]
    fn user_password_is_not_enough_when_full_access_is_requested() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locked = encrypted_fixture(dir.path());
        let query = Answers {
            answers: vec!["owner"],
            asked: Cell::new(0),
            saw_retry: Cell::new(false),
        };
        let opened =
            DocumentReader::open(&locked, "user", &OpenOption::default(), &query).expect("open");
        assert!(opened.source.full_access());
        assert_eq!(query.asked.get(), 1);
        assert!(query.saw_retry.get());
    }

    #[test]
    fn query_is_asked_again_after_a_wrong_answer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locked = encrypted_fixture(dir.path());
        let query = Answers {
            answers: vec!["wrong", "user", "owner"],
            asked: Cell::new(0),
            saw_retry: Cell::new(false),
        };
        let opened =
            DocumentReader::open(&locked, "", &OpenOption::default(), &query).expect("open");
        assert_eq!(opened.pages.len(), 2);
        assert_eq!(query.asked.get(), 3);
        assert!(query.saw_retry.get());
    }

    #[test]
    fn aes_outputs_reopen_with_their_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plain = dir.path().join("plain.pdf");
        sample_pdf(&plain, 1);

        for method in [
            EncryptionMethod::Aes128,
            EncryptionMethod::Aes256,
            EncryptionMethod::Aes256r6,
        ] {
            let locked = dir.path().join(format!("{method:?}.pdf"));
            rewrite(
                &plain,
                &locked,
                None,
                Encryption {
                    enabled: true,
                    method,
                    owner_password: "owner".into(),
                    user_password: "user".into(),
                    open_with_password: true,
                    ..Encryption::default()
                },
            );

            let denied = LopdfSource::open(&locked, "", &OpenOption::default());
            assert!(matches!(denied, Err(FolioError::PasswordRequired { .. })));

            let source =
                LopdfSource::open(&locked, "owner", &OpenOption::default()).expect("open");
            assert!(source.full_access());
            assert_eq!(source.page_count(), 1);
            assert!(page_text(&source, 1).contains("(Page 1)"));
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.xyz");
        std::fs::write(&path, b"plain text").expect("write");
        let err = DocumentReader::open(&path, "", &OpenOption::default(), &NoPassword)
            .err()
            .expect("should fail");
        assert!(matches!(err, FolioError::UnsupportedDocument(_)));
    }
}
