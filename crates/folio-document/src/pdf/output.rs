// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output document: pages copied from open sources, embedded files, and the
// final metadata/encryption pass, using `lopdf`.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_core::codec::{OutputDocument, SourceHandle};
use folio_core::config::SaveOption;
use folio_core::error::{FolioError, Result};
use folio_core::{Attachment, Encryption, EncryptionMethod, Metadata, Permission};
use lopdf::encryption::crypt_filters::{Aes128CryptFilter, Aes256CryptFilter, CryptFilter};
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Stream, StringFormat,
};
use tracing::{debug, info, instrument, warn};

use super::objects::{INHERITABLE, inherited, text_string};
use super::reader::LopdfSource;

/// Source object id to output object id.
type ObjectMap = HashMap<ObjectId, ObjectId>;

/// A PDF under construction.
pub struct LopdfOutput {
    document: Document,
    catalog_id: ObjectId,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Embedded files as (name tree key, file specification).
    files: Vec<(String, ObjectId)>,
    /// Objects already copied per source, reused when `smart_copy` is on.
    shared: HashMap<PathBuf, ObjectMap>,
    smart_copy: bool,
    shrink: bool,
    require_full_access: bool,
}

impl LopdfOutput {
    /// Create an empty document with a catalog and an empty page tree.
    pub fn new(options: &SaveOption) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(Object::Dictionary(catalog));
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            catalog_id,
            pages_id,
            kids: Vec::new(),
            files: Vec::new(),
            shared: HashMap::new(),
            smart_copy: options.smart_copy,
            shrink: options.shrink,
            require_full_access: options.open.full_access,
        }
    }

    /// Clone page `page_id` of `source` (with everything it references) and
    /// append it to the page tree.
    fn copy_page(&mut self, source: &Document, page_id: ObjectId, memo: &mut ObjectMap) -> Result<()> {
        let page = source.get_dictionary(page_id).map_err(|err| {
            FolioError::Pdf(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        // Attributes inherited from the source's page tree would be lost
        // once /Parent is replaced, so pin them on the page itself.
        let mut page = page.clone();
        page.remove(b"Parent");
        for key in INHERITABLE {
            if !page.has(key)
                && let Some(value) = inherited(source, page_id, key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }

        // The page itself is always fresh: the same source page may be
        // copied several times with different rotations.
        let new_page_id = self.document.new_object_id();
        memo.insert(page_id, new_page_id);
        let cloned = deep_clone_object(source, &mut self.document, memo, &Object::Dictionary(page));
        memo.remove(&page_id);

        let mut cloned = match cloned {
            Object::Dictionary(dict) => dict,
            _ => {
                return Err(FolioError::Pdf(format!(
                    "page {:?} did not clone into a dictionary",
                    page_id
                )));
            }
        };
        cloned.set("Parent", Object::Reference(self.pages_id));
        self.document
            .objects
            .insert(new_page_id, Object::Dictionary(cloned));
        self.kids.push(new_page_id);
        Ok(())
    }

    /// Name tree key for `name`, made unique among embedded files.
    fn unique_key(&self, name: &str) -> String {
        let taken = |key: &str| self.files.iter().any(|(k, _)| k == key);
        if !taken(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name} ({n})"))
            .find(|key| !taken(key))
            .unwrap_or_else(|| name.to_string())
    }

    fn write_page_tree(&mut self) -> Result<()> {
        let pages = self
            .document
            .get_dictionary_mut(self.pages_id)
            .map_err(|err| FolioError::Pdf(format!("invalid pages dictionary: {err}")))?;
        pages.set(
            "Kids",
            Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
        );
        pages.set("Count", Object::Integer(self.kids.len() as i64));
        Ok(())
    }

    fn write_catalog(&mut self, metadata: &Metadata) -> Result<()> {
        let mut files = std::mem::take(&mut self.files);
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let catalog = self
            .document
            .get_dictionary_mut(self.catalog_id)
            .map_err(|err| FolioError::Pdf(format!("invalid catalog: {err}")))?;
        catalog.set("PageLayout", Object::Name(metadata.layout.pdf_name().as_bytes().to_vec()));
        catalog.set("PageMode", Object::Name(metadata.mode.pdf_name().as_bytes().to_vec()));

        if !files.is_empty() {
            let mut names = Vec::with_capacity(files.len() * 2);
            for (key, spec) in files {
                names.push(text_string(&key));
                names.push(Object::Reference(spec));
            }
            let mut tree = Dictionary::new();
            tree.set("Names", Object::Array(names));
            let mut dict = Dictionary::new();
            dict.set("EmbeddedFiles", Object::Dictionary(tree));
            catalog.set("Names", Object::Dictionary(dict));
        }
        Ok(())
    }

    fn write_info(&mut self, metadata: &Metadata) {
        self.document.version = metadata.version.to_string();

        let mut info = Dictionary::new();
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
            ("Creator", &metadata.creator),
            ("Producer", &metadata.producer),
        ];
        for (key, value) in fields {
            if !value.is_empty() {
                info.set(key, text_string(value));
            }
        }
        let created = metadata.created.unwrap_or_else(Utc::now);
        let modified = metadata.modified.unwrap_or(created);
        info.set("CreationDate", pdf_date(created));
        info.set("ModDate", pdf_date(modified));

        let info_id = self.document.add_object(Object::Dictionary(info));
        self.document.trailer.set("Info", Object::Reference(info_id));
    }
}

impl OutputDocument for LopdfOutput {
    type Source = LopdfSource;

    #[instrument(skip_all, fields(path = %source.path().display(), pages = numbers.len()))]
    fn copy_pages(&mut self, source: &LopdfSource, numbers: &[u32]) -> Result<()> {
        if self.require_full_access && !source.full_access() {
            return Err(FolioError::RestrictedSource {
                path: source.path().to_path_buf(),
            });
        }

        let mut memo = if self.smart_copy {
            self.shared.remove(source.path()).unwrap_or_default()
        } else {
            ObjectMap::new()
        };

        let mut outcome = Ok(());
        for &number in numbers {
            outcome = source
                .page_id(number)
                .and_then(|page_id| self.copy_page(source.document(), page_id, &mut memo));
            if outcome.is_err() {
                break;
            }
            if !self.smart_copy {
                memo.clear();
            }
        }

        if self.smart_copy {
            self.shared.insert(source.path().to_path_buf(), memo);
        }
        debug!(total_pages = self.kids.len(), "Pages copied");
        outcome
    }

    #[instrument(skip_all, fields(name = %attachment.name(), length = attachment.length()))]
    fn embed_attachment(&mut self, attachment: &Attachment) -> Result<()> {
        let data = attachment.data()?.to_vec();

        let mut params = Dictionary::new();
        params.set("Size", Object::Integer(data.len() as i64));
        let mut stream_dict = Dictionary::new();
        stream_dict.set("Type", Object::Name(b"EmbeddedFile".to_vec()));
        stream_dict.set("Params", Object::Dictionary(params));
        let stream_id = self
            .document
            .add_object(Object::Stream(Stream::new(stream_dict, data)));

        let mut ef = Dictionary::new();
        ef.set("F", Object::Reference(stream_id));
        ef.set("UF", Object::Reference(stream_id));
        let mut spec = Dictionary::new();
        spec.set("Type", Object::Name(b"Filespec".to_vec()));
        spec.set("F", text_string(attachment.name()));
        spec.set("UF", text_string(attachment.name()));
        spec.set("EF", Object::Dictionary(ef));
        let spec_id = self.document.add_object(Object::Dictionary(spec));

        let key = self.unique_key(attachment.name());
        if key != attachment.name() {
            warn!(%key, "Attachment name already embedded, using a distinct key");
        }
        self.files.push((key, spec_id));
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    #[instrument(skip_all, fields(pages = self.kids.len(), encrypted = encryption.enabled))]
    fn finish(
        mut self,
        writer: &mut dyn Write,
        metadata: &Metadata,
        encryption: &Encryption,
    ) -> Result<()> {
        self.write_page_tree()?;
        self.write_catalog(metadata)?;
        self.write_info(metadata);

        if self.shrink {
            self.document.compress();
        }
        if encryption.enabled {
            encrypt(&mut self.document, encryption)?;
        }

        let mut sink = writer;
        self.document.save_to(&mut sink).map_err(|err| {
            FolioError::Pdf(format!("failed to serialise output PDF: {}", err))
        })?;
        info!(version = %metadata.version, "Output written");
        Ok(())
    }
}

/// Apply the standard security handler to `document`.
fn encrypt(document: &mut Document, encryption: &Encryption) -> Result<()> {
    if encryption.owner_password.is_empty() {
        return Err(FolioError::Pdf(
            "encryption requires an owner password".into(),
        ));
    }

    // The file identifier feeds the key derivation.
    let id = uuid::Uuid::new_v4().as_bytes().to_vec();
    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );

    let owner_password = encryption.owner_password.as_str();
    let user_password = encryption.effective_user_password();
    let permissions = to_lopdf_permissions(encryption.permission);
    let file_key = random_file_key();

    let source: &Document = document;
    #[allow(deprecated)]
    let version = match encryption.method {
        EncryptionMethod::Standard40 => EncryptionVersion::V1 {
            document: source,
            owner_password,
            user_password,
            permissions,
        },
        EncryptionMethod::Standard128 => EncryptionVersion::V2 {
            document: source,
            owner_password,
            user_password,
            key_length: 128,
            permissions,
        },
        EncryptionMethod::Aes128 => EncryptionVersion::V4 {
            document: source,
            encrypt_metadata: true,
            crypt_filters: standard_filter(Arc::new(Aes128CryptFilter)),
            stream_filter: STANDARD_FILTER.to_vec(),
            string_filter: STANDARD_FILTER.to_vec(),
            owner_password,
            user_password,
            permissions,
        },
        EncryptionMethod::Aes256 => EncryptionVersion::R5 {
            encrypt_metadata: true,
            crypt_filters: standard_filter(Arc::new(Aes256CryptFilter)),
            file_encryption_key: &file_key,
            stream_filter: STANDARD_FILTER.to_vec(),
            string_filter: STANDARD_FILTER.to_vec(),
            owner_password,
            user_password,
            permissions,
        },
        EncryptionMethod::Aes256r6 => EncryptionVersion::V5 {
            encrypt_metadata: true,
            crypt_filters: standard_filter(Arc::new(Aes256CryptFilter)),
            file_encryption_key: &file_key,
            stream_filter: STANDARD_FILTER.to_vec(),
            string_filter: STANDARD_FILTER.to_vec(),
            owner_password,
            user_password,
            permissions,
        },
    };

    let state = EncryptionState::try_from(version).map_err(|err| {
        FolioError::UnsupportedEncryption(format!("{}: {err}", encryption.method))
    })?;
    document
        .encrypt(&state)
        .map_err(|err| FolioError::Pdf(format!("encryption failed: {err}")))?;
    debug!(method = %encryption.method, "Output encrypted");
    Ok(())
}

/// Name of the single crypt filter used for strings and streams.
const STANDARD_FILTER: &[u8] = b"StdCF";

fn standard_filter(filter: Arc<dyn CryptFilter>) -> BTreeMap<Vec<u8>, Arc<dyn CryptFilter>> {
    BTreeMap::from([(STANDARD_FILTER.to_vec(), filter)])
}

/// 256-bit file key for the revision 5 and 6 handlers.
fn random_file_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    key[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    key
}

fn to_lopdf_permissions(permission: Permission) -> Permissions {
    let table = [
        (Permission::PRINT, Permissions::PRINTABLE),
        (Permission::MODIFY, Permissions::MODIFIABLE),
        (Permission::COPY, Permissions::COPYABLE),
        (Permission::ANNOTATE, Permissions::ANNOTABLE),
        (Permission::FILL_FORM, Permissions::FILLABLE),
        (Permission::ACCESSIBILITY, Permissions::COPYABLE_FOR_ACCESSIBILITY),
        (Permission::ASSEMBLE, Permissions::ASSEMBLABLE),
        (Permission::PRINT_HIGH_QUALITY, Permissions::PRINTABLE_IN_HIGH_QUALITY),
    ];
    table
        .into_iter()
        .filter(|(ours, _)| permission.allows(*ours))
        .fold(Permissions::empty(), |acc, (_, theirs)| acc | theirs)
}

fn pdf_date(time: DateTime<Utc>) -> Object {
    Object::String(
        time.format("D:%Y%m%d%H%M%S+00'00'").to_string().into_bytes(),
        StringFormat::Literal,
    )
}

/// Deep-clone `object` from `source` into `target`, copying every object it
/// references exactly once per `memo`. `/Parent` links of page tree nodes are
/// skipped so a reference to another page never drags in the source's whole
/// tree; callers patch the copied page's parent themselves.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    memo: &mut ObjectMap,
    object: &Object,
) -> Object {
    match object {
        Object::Dictionary(dict) => Object::Dictionary(clone_dictionary(source, target, memo, dict)),
        Object::Array(arr) => Object::Array(
            arr.iter()
                .map(|item| deep_clone_object(source, target, memo, item))
                .collect(),
        ),
        Object::Reference(ref_id) => {
            if let Some(&copied) = memo.get(ref_id) {
                return Object::Reference(copied);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    // Reserve the id first so cycles resolve to it.
                    let new_id = target.new_object_id();
                    memo.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, memo, referenced);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Stream(stream) => Object::Stream(Stream::new(
            clone_dictionary(source, target, memo, &stream.dict),
            stream.content.clone(),
        )),
        // Boolean, Integer, Real, String, Name, Null.
        other => other.clone(),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    memo: &mut ObjectMap,
    dict: &Dictionary,
) -> Dictionary {
    let page_node = matches!(
        dict.get(b"Type"),
        Ok(Object::Name(name)) if name == b"Page" || name == b"Pages"
    );
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if page_node && key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), deep_clone_object(source, target, memo, value));
    }
    new_dict
}
