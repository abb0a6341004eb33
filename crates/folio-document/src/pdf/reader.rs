// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF source: an open, decrypted `lopdf::Document` plus the page geometry
// and attachments the composition engine needs.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use folio_core::codec::SourceHandle;
use folio_core::config::OpenOption;
use folio_core::error::{FolioError, Result};
use folio_core::{Angle, Attachment, Size};
use lopdf::xref::XrefEntry;
use lopdf::{Dictionary, Document, Object, ObjectId, Reader};
use tracing::{debug, info, instrument, warn};

use super::objects::{self, decode_text, inherited, resolve};

/// Letter size, used when a page has no usable `/MediaBox`.
const FALLBACK_SIZE: Size = Size {
    width: 612.0,
    height: 792.0,
};

/// An open PDF source.
pub struct LopdfSource {
    document: Document,
    path: PathBuf,
    /// Page number (1-based) to page object.
    pages: BTreeMap<u32, ObjectId>,
    full_access: bool,
}

impl LopdfSource {
    // -- Construction ---------------------------------------------------------

    /// Open and decrypt the PDF at `path`.
    ///
    /// `password` may be the user or the owner password; only the owner
    /// password grants full access. An empty `password` opens unencrypted
    /// documents and documents without a user password (with user rights).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, password: &str, options: &OpenOption) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening PDF");

        let buffered = if options.save_memory {
            None
        } else {
            Some(fs::read(path)?)
        };
        let document = match &buffered {
            Some(bytes) => Document::load_mem(bytes),
            None => Document::load(path),
        }
        .map_err(|err| source_open(path, err))?;

        if !document.is_encrypted() {
            let source = Self::from_document(document, path.to_path_buf(), true);
            debug!(pages = source.pages.len(), "PDF opened");
            return Ok(source);
        }

        if document.authenticate_password(password).is_err() {
            return Err(if password.is_empty() {
                FolioError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            } else {
                FolioError::BadPassword {
                    path: path.to_path_buf(),
                }
            });
        }
        let full_access = document.authenticate_owner_password(password).is_ok();

        let bytes = match buffered {
            Some(bytes) => bytes,
            None => fs::read(path)?,
        };
        let mut document = load_encrypted(&bytes, document);
        document
            .decrypt(password)
            .map_err(|err| source_open(path, err))?;

        let source = Self::from_document(document, path.to_path_buf(), full_access);
        if source.pages.is_empty() {
            return Err(FolioError::SourceOpen {
                path: path.to_path_buf(),
                reason: "no pages found after decryption".into(),
            });
        }
        debug!(pages = source.pages.len(), full_access, "Encrypted PDF opened");
        Ok(source)
    }

    /// Wrap PDF bytes produced in memory (e.g. a synthesized image page)
    /// under the path of the file they stand for.
    #[instrument(skip_all, fields(path = %path.display(), bytes_len = data.len()))]
    pub fn from_bytes(path: PathBuf, data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| source_open(&path, err))?;
        Ok(Self::from_document(document, path, true))
    }

    fn from_document(document: Document, path: PathBuf, full_access: bool) -> Self {
        let pages = document.get_pages();
        Self {
            document,
            path,
            pages,
            full_access,
        }
    }

    // -- Inspection -----------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Whether the source was opened with owner rights (always true for
    /// unencrypted documents).
    pub fn full_access(&self) -> bool {
        self.full_access
    }

    /// Object id of page `number` (1-based).
    pub fn page_id(&self, number: u32) -> Result<ObjectId> {
        self.pages
            .get(&number)
            .copied()
            .ok_or_else(|| FolioError::InvalidPage {
                path: self.path.clone(),
                number,
                count: self.pages.len() as u32,
            })
    }

    /// Page size in points from the (possibly inherited) `/MediaBox`.
    pub fn page_size(&self, number: u32) -> Result<Size> {
        let page_id = self.page_id(number)?;
        let size = inherited(&self.document, page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| {
                let values: Vec<f32> = arr
                    .iter()
                    .filter_map(|o| resolve(&self.document, o).and_then(objects::number))
                    .collect();
                match values.as_slice() {
                    [x0, y0, x1, y1] => Some(Size::new((x1 - x0).abs(), (y1 - y0).abs())),
                    _ => None,
                }
            });
        Ok(size.unwrap_or_else(|| {
            warn!(number, "Page has no usable MediaBox, assuming Letter");
            FALLBACK_SIZE
        }))
    }

    /// Rotation stored on page `number`, including inherited `/Rotate`.
    pub fn page_rotation(&self, number: u32) -> Result<Angle> {
        let page_id = self.page_id(number)?;
        let degrees = inherited(&self.document, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        Ok(Angle::new(degrees as i32).unwrap_or_else(|_| {
            warn!(number, degrees, "Ignoring invalid /Rotate");
            Angle::ZERO
        }))
    }

    // -- Attachments ----------------------------------------------------------

    /// Walk the `/EmbeddedFiles` name tree and decode every file found.
    fn collect_attachments(&self) -> Vec<Attachment> {
        let mut found = Vec::new();
        let tree = self
            .document
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Names").ok())
            .and_then(|names| resolve(&self.document, names))
            .and_then(|names| names.as_dict().ok())
            .and_then(|names| names.get(b"EmbeddedFiles").ok())
            .and_then(|tree| resolve(&self.document, tree))
            .and_then(|tree| tree.as_dict().ok());

        if let Some(tree) = tree {
            self.walk_name_tree(tree, &mut found, 0);
        }
        found
    }

    fn walk_name_tree(&self, node: &Dictionary, found: &mut Vec<Attachment>, depth: usize) {
        if depth > 32 {
            warn!("EmbeddedFiles name tree too deep, stopping");
            return;
        }

        if let Ok(Object::Array(pairs)) = node.get(b"Names") {
            for pair in pairs.chunks_exact(2) {
                let key = match &pair[0] {
                    Object::String(bytes, _) => decode_text(bytes),
                    _ => continue,
                };
                match self.decode_filespec(&pair[1], &key) {
                    Some(attachment) => found.push(attachment),
                    None => warn!(name = %key, "Skipping unreadable embedded file"),
                }
            }
        }

        if let Ok(Object::Array(kids)) = node.get(b"Kids") {
            for kid in kids {
                if let Some(Ok(child)) = resolve(&self.document, kid).map(|k| k.as_dict()) {
                    self.walk_name_tree(child, found, depth + 1);
                }
            }
        }
    }

    fn decode_filespec(&self, spec: &Object, key: &str) -> Option<Attachment> {
        let spec = resolve(&self.document, spec)?.as_dict().ok()?;
        let name = [b"UF".as_slice(), b"F".as_slice()]
            .iter()
            .find_map(|k| match spec.get(k).ok() {
                Some(Object::String(bytes, _)) => Some(decode_text(bytes)),
                _ => None,
            })
            .unwrap_or_else(|| key.to_string());

        let ef = resolve(&self.document, spec.get(b"EF").ok()?)?.as_dict().ok()?;
        let stream_obj = ef.get(b"UF").or_else(|_| ef.get(b"F")).ok()?;
        let stream = resolve(&self.document, stream_obj)?.as_stream().ok()?;
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        Some(Attachment::from_bytes(name, data))
    }
}

/// Re-read every object of an encrypted file without decrypting it.
///
/// `lopdf` only parses the objects of an encrypted file when the user
/// password is empty; otherwise `skeleton` holds nothing but the trailer, the
/// cross-reference table and the `/Encrypt` dictionary. The raw objects
/// parsed here are decrypted afterwards by `Document::decrypt`.
fn load_encrypted(bytes: &[u8], skeleton: Document) -> Document {
    let ids: Vec<ObjectId> = skeleton
        .reference_table
        .entries
        .iter()
        .filter_map(|(&number, entry)| match *entry {
            XrefEntry::Normal { generation, .. } => Some((number, generation)),
            _ => None,
        })
        .collect();

    let reader = Reader {
        buffer: bytes,
        document: skeleton,
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };
    let mut objects = BTreeMap::new();
    for id in ids {
        match reader.get_object(id, &mut HashSet::new()) {
            Ok(object) => {
                objects.insert(id, object);
            }
            Err(err) => warn!(?id, %err, "Skipping unreadable object"),
        }
    }

    let mut document = reader.document;
    document.objects = objects;
    document.encryption_state = None;
    document
}

fn source_open(path: &Path, err: lopdf::Error) -> FolioError {
    FolioError::SourceOpen {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

impl SourceHandle for LopdfSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn set_rotation(&mut self, number: u32, angle: Angle) -> Result<()> {
        let page_id = self.page_id(number)?;
        let page = self
            .document
            .get_dictionary_mut(page_id)
            .map_err(|err| FolioError::Pdf(format!("page {number} is not a dictionary: {err}")))?;
        page.set("Rotate", Object::Integer(angle.degrees() as i64));
        Ok(())
    }

    fn attachments(&self) -> Result<Vec<Attachment>> {
        let found = self.collect_attachments();
        debug!(path = %self.path.display(), count = found.len(), "Embedded files found");
        Ok(found)
    }
}

impl std::fmt::Debug for LopdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfSource")
            .field("path", &self.path)
            .field("pages", &self.pages.len())
            .field("full_access", &self.full_access)
            .finish()
    }
}
