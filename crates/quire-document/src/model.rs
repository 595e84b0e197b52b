// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document model — an addressable, page-indexed wrapper over `lopdf`.
//
// Pages are addressed by 0-based position. Copying pages between models
// deep-clones the page object graph, so mutating a copy never touches the
// source document. The page tree is kept flat: every structural mutation
// rewrites the root /Kids array, materializing inheritable attributes into
// the page dictionaries first so nothing is lost when a page is re-parented.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use quire_core::error::{QuireError, Result};
use tracing::{debug, info, instrument, warn};

/// Default page dimensions (US Letter, points) when no MediaBox is present.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Page attributes that PDF allows to live on ancestor page-tree nodes.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// An in-memory document, exclusively owned by the operation that made it.
pub struct DocumentModel {
    pub(crate) doc: Document,
    /// Cached Helvetica font object, registered on first text draw.
    pub(crate) helvetica: Option<ObjectId>,
    /// Counter for unique image XObject resource names.
    pub(crate) image_counter: u32,
}

impl DocumentModel {
    // -- Construction ---------------------------------------------------------

    /// Create an empty document: a valid catalog and page tree, zero pages.
    pub fn create() -> Self {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(0));
        pages.set("Kids", Object::Array(Vec::new()));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));

        doc.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            doc,
            helvetica: None,
            image_counter: 0,
        }
    }

    /// Load a document from raw bytes.
    ///
    /// Encrypted documents require a password: absent one the load fails with
    /// `RequiresPassword`; a rejected password fails with `WrongPassword`.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8], password: Option<&str>) -> Result<Self> {
        let mut doc = Document::load_mem(bytes)
            .map_err(|err| QuireError::CorruptDocument(err.to_string()))?;

        if doc.is_encrypted() {
            let password = password.ok_or(QuireError::RequiresPassword)?;
            doc.decrypt(password).map_err(|err| {
                debug!(%err, "password rejected");
                QuireError::WrongPassword
            })?;
        }

        debug!(pages = doc.get_pages().len(), "document loaded");
        Ok(Self {
            doc,
            helvetica: None,
            image_counter: 0,
        })
    }

    /// Load a document from the filesystem.
    pub fn from_file(path: impl AsRef<std::path::Path>, password: Option<&str>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, password)
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object IDs in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // get_pages is keyed by 1-based page number; BTreeMap iteration
        // yields them in order.
        self.doc.get_pages().into_values().collect()
    }

    /// Whether the underlying document carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Page size in points (width, height), honouring MediaBox inheritance.
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        let page_id = self.page_id(index)?;
        let media_box = self
            .page_attribute(page_id, b"MediaBox")
            .and_then(|obj| rectangle(&self.doc, &obj));
        Ok(media_box.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Current /Rotate value of a page, reduced into [0, 360).
    pub fn rotation(&self, index: usize) -> Result<i64> {
        let page_id = self.page_id(index)?;
        let rotation = self
            .page_attribute(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        Ok(rotation.rem_euclid(360))
    }

    /// Per-page text extraction, capped at `max_pages`. Pages that yield no
    /// text (or fail to parse) contribute an empty section rather than an
    /// error; extraction is a best-effort stage.
    pub fn extract_text(&self, max_pages: usize) -> String {
        let total = self.page_count().min(max_pages);
        let mut out = String::new();
        for page_number in 1..=total as u32 {
            let text = self.doc.extract_text(&[page_number]).unwrap_or_default();
            out.push_str(&format!("\n\n=== Page {page_number} ===\n{text}"));
        }
        out
    }

    // -- Page copying ---------------------------------------------------------

    /// Deep-copy the pages of `src` at `indices` (0-based) and append them to
    /// this document. `src` is never mutated. Out-of-range indices are
    /// skipped; batch call sites validate through `PageSelector` first.
    pub fn copy_pages_from(&mut self, src: &DocumentModel, indices: &[usize]) -> Result<Vec<ObjectId>> {
        let position = self.page_count();
        self.insert_pages_from(src, indices, position)
    }

    /// Deep-copy pages of `src` and splice them in at `position`, clamped to
    /// `[0, page_count]`. Returns the new page IDs in insertion order.
    #[instrument(skip_all, fields(count = indices.len(), position))]
    pub fn insert_pages_from(
        &mut self,
        src: &DocumentModel,
        indices: &[usize],
        position: usize,
    ) -> Result<Vec<ObjectId>> {
        let src_ids = src.page_ids();
        // One memo per copy: objects shared between the copied pages are
        // cloned once and referenced from each.
        let mut memo = BTreeMap::new();
        let mut cloned = Vec::new();
        for &index in indices {
            let Some(&page_id) = src_ids.get(index) else {
                warn!(index, pages = src_ids.len(), "skipping out-of-range page copy");
                continue;
            };
            cloned.push(self.clone_page_from(&src.doc, page_id, &mut memo)?);
        }

        let mut order = self.page_ids();
        let position = position.min(order.len());
        for (offset, &id) in cloned.iter().enumerate() {
            order.insert(position + offset, id);
        }
        self.set_page_order(&order)?;

        debug!(inserted = cloned.len(), "pages inserted");
        Ok(cloned)
    }

    /// Append a blank page of the given size (points).
    pub fn add_blank_page(&mut self, width: f32, height: f32) -> Result<ObjectId> {
        let contents_id = self.doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
        );
        page.set("Contents", Object::Reference(contents_id));
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        let page_id = self.doc.add_object(Object::Dictionary(page));

        let mut order = self.page_ids();
        order.push(page_id);
        self.set_page_order(&order)?;
        Ok(page_id)
    }

    /// Remove a single page. Strict: an out-of-range index is an error.
    pub fn remove_page(&mut self, index: usize) -> Result<()> {
        let order = self.page_ids();
        if index >= order.len() {
            return Err(QuireError::IndexOutOfRange {
                index,
                page_count: order.len(),
            });
        }
        let kept: Vec<ObjectId> = order
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, id)| *id)
            .collect();
        self.set_page_order(&kept)
    }

    // -- Page mutation --------------------------------------------------------

    /// Add `degrees` to a page's rotation, reduced into [0, 360).
    pub fn rotate_page(&mut self, index: usize, degrees: i64) -> Result<()> {
        let existing = self.rotation(index)?;
        let page_id = self.page_id(index)?;
        let new_rotation = (existing + degrees).rem_euclid(360);
        if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
            dict.set("Rotate", Object::Integer(new_rotation));
        }
        Ok(())
    }

    /// Set an explicit page size (points). Absolute, not additive.
    pub fn set_page_size(&mut self, index: usize, width: f32, height: f32) -> Result<()> {
        let page_id = self.page_id(index)?;
        if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
            dict.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ]),
            );
        }
        Ok(())
    }

    // -- Encryption -----------------------------------------------------------

    /// Encrypt the document with matching user/owner passwords and a
    /// printing-allowed permission set.
    #[instrument(skip_all)]
    pub fn encrypt(&mut self, user_password: &str, owner_password: &str) -> Result<()> {
        use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};

        // The encryption key derivation consumes the trailer /ID; documents
        // built from scratch have none yet.
        self.ensure_file_id();

        let mut permissions = Permissions::empty();
        permissions.insert(Permissions::PRINTABLE);

        let state = {
            let version = EncryptionVersion::V2 {
                document: &self.doc,
                owner_password,
                user_password,
                key_length: 128,
                permissions,
            };
            EncryptionState::try_from(version)
                .map_err(|err| QuireError::Encryption(err.to_string()))?
        };

        self.doc
            .encrypt(&state)
            .map_err(|err| QuireError::Encryption(err.to_string()))?;
        info!("document encrypted");
        Ok(())
    }

    // -- Serialization --------------------------------------------------------

    /// Serialize the current model state. Deterministic for a given state;
    /// the model itself is left untouched.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut doc = self.doc.clone();
        doc.compress();
        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| QuireError::Pdf(format!("failed to serialize document: {err}")))?;
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    /// Give the document a trailer /ID pair if it lacks one.
    fn ensure_file_id(&mut self) {
        if self.doc.trailer.get(b"ID").is_ok() {
            return;
        }
        let id = uuid::Uuid::new_v4().as_bytes().to_vec();
        self.doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(id.clone(), StringFormat::Hexadecimal),
                Object::String(id, StringFormat::Hexadecimal),
            ]),
        );
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        let ids = self.page_ids();
        ids.get(index).copied().ok_or(QuireError::IndexOutOfRange {
            index,
            page_count: ids.len(),
        })
    }

    /// Look up a page attribute, walking /Parent links for inheritable keys.
    fn page_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = page_id;
        // Bounded walk; malformed documents can have parent cycles.
        for _ in 0..32 {
            let Ok(Object::Dictionary(dict)) = self.doc.get_object(current) else {
                return None;
            };
            if let Ok(value) = dict.get(key) {
                let value = match value {
                    Object::Reference(id) => self.doc.get_object(*id).ok()?.clone(),
                    other => other.clone(),
                };
                return Some(value);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
        None
    }

    /// The root /Pages node referenced from the catalog.
    fn pages_root(&self) -> Result<ObjectId> {
        let catalog = self
            .doc
            .catalog()
            .map_err(|err| QuireError::Pdf(format!("no catalog: {err}")))?;
        match catalog.get(b"Pages") {
            Ok(Object::Reference(id)) => Ok(*id),
            _ => Err(QuireError::Pdf("/Pages is not a reference".to_string())),
        }
    }

    /// Rewrite the root page tree so its /Kids are exactly `order`, flat.
    ///
    /// Before re-parenting, inheritable attributes are materialized into each
    /// page dictionary so pages lifted out of nested tree nodes keep their
    /// resources and geometry.
    pub(crate) fn set_page_order(&mut self, order: &[ObjectId]) -> Result<()> {
        let pages_id = self.pages_root()?;

        for &page_id in order {
            for key in INHERITABLE_KEYS {
                let already_present = matches!(
                    self.doc.get_object(page_id),
                    Ok(Object::Dictionary(dict)) if dict.get(key).is_ok()
                );
                if already_present {
                    continue;
                }
                if let Some(value) = self.page_attribute(page_id, key) {
                    if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
                        dict.set(key, value);
                    }
                }
            }
        }

        let kids: Vec<Object> = order.iter().map(|&id| Object::Reference(id)).collect();
        if let Ok(Object::Dictionary(pages_dict)) = self.doc.get_object_mut(pages_id) {
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(order.len() as i64));
        }

        for &page_id in order {
            if let Ok(Object::Dictionary(page_dict)) = self.doc.get_object_mut(page_id) {
                page_dict.set("Parent", Object::Reference(pages_id));
            }
        }
        Ok(())
    }

    /// Deep-clone one page object (and everything it references) from
    /// `source` into this document, without attaching it to the page tree.
    ///
    /// The page's own mapping is registered in `memo` up front so objects
    /// pointing back at the page (an annotation's /P, say) resolve to the
    /// clone instead of recursing.
    fn clone_page_from(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        memo: &mut BTreeMap<ObjectId, ObjectId>,
    ) -> Result<ObjectId> {
        let page_object = source
            .get_object(page_id)
            .map_err(|err| QuireError::Pdf(format!("cannot read page object {page_id:?}: {err}")))?;

        let new_id = self.doc.new_object_id();
        memo.insert(page_id, new_id);

        // Materialize inheritable attributes before cloning; the clone loses
        // its /Parent chain.
        let mut cloned = deep_clone_object(source, &mut self.doc, page_object, memo)?;
        if let Object::Dictionary(ref mut dict) = cloned {
            for key in INHERITABLE_KEYS {
                if dict.get(key).is_err() {
                    if let Some(value) = inherited_attribute(source, page_id, key) {
                        let value = deep_clone_object(source, &mut self.doc, &value, memo)?;
                        dict.set(key, value);
                    }
                }
            }
        }
        self.doc.objects.insert(new_id, cloned);
        Ok(new_id)
    }
}

/// Walk /Parent links in `source` looking for an attribute.
fn inherited_attribute(source: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..32 {
        let Ok(Object::Dictionary(dict)) = source.get_object(current) else {
            return None;
        };
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

/// Deep-clone a single lopdf Object, recursively resolving references
/// (except /Parent, which is deliberately skipped — the page tree rewrite
/// patches it).
///
/// `memo` maps already-cloned source ids to their target ids. It both
/// dedupes objects referenced from several places and breaks reference
/// cycles: the mapping is registered before the referenced object's content
/// is cloned.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    memo: &mut BTreeMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned = deep_clone_object(source, target, value, memo)?;
                new_dict.set(key.clone(), cloned);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(array) => {
            let mut new_array = Vec::with_capacity(array.len());
            for item in array {
                new_array.push(deep_clone_object(source, target, item, memo)?);
            }
            Ok(Object::Array(new_array))
        }
        Object::Reference(ref_id) => {
            if let Some(&mapped) = memo.get(ref_id) {
                return Ok(Object::Reference(mapped));
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    memo.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, memo)?;
                    target.objects.insert(new_id, cloned);
                    Ok(Object::Reference(new_id))
                }
                Err(err) => {
                    warn!(?ref_id, %err, "cannot resolve reference, using Null");
                    Ok(Object::Null)
                }
            }
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned = deep_clone_object(source, target, value, memo)?;
                new_dict.set(key.clone(), cloned);
            }
            Ok(Object::Stream(Stream::new(new_dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

/// Interpret a 4-number array as (width, height).
fn rectangle(doc: &Document, object: &Object) -> Option<(f32, f32)> {
    let array = match object {
        Object::Array(array) => array.clone(),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Array(array) => array.clone(),
            _ => return None,
        },
        _ => return None,
    };
    if array.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(array.iter()) {
        *slot = number(value)?;
    }
    Some(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}
