// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range extraction — copy an inclusive, 1-based page range out of a PDF
// into a new standalone document, optionally persisted to a temporary file.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use printwire_core::error::{PrintwireError, Result};
use printwire_core::types::PageRange;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use super::document::{PdfDocument, inherited_attribute};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// A requested range that clamped to zero pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWarning {
    pub requested: PageRange,
    pub page_count: u32,
}

impl RangeWarning {
    /// The warning as an `InvalidRange` error, for callers that refuse empty jobs.
    pub fn to_error(&self) -> PrintwireError {
        PrintwireError::InvalidRange {
            start: self.requested.start,
            end: self.requested.end,
            page_count: self.page_count,
        }
    }
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid page range: start={} > end={} (document has {} pages)",
            self.requested.start.max(1),
            self.requested.end.min(self.page_count),
            self.page_count
        )
    }
}

/// Result of copying a page range into a new document.
pub struct Extraction {
    pub document: PdfDocument,
    /// Set when the range selected no pages; `document` is then empty.
    pub warning: Option<RangeWarning>,
}

/// An extracted range persisted to disk.
///
/// The file is deleted when this value is dropped, unless [`ExtractedFile::keep`]
/// is called.
pub struct ExtractedFile {
    file: NamedTempFile,
    pub page_count: u32,
    pub warning: Option<RangeWarning>,
}

impl ExtractedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Persist the file past the end of the request and return its path.
    pub fn keep(self) -> Result<PathBuf> {
        let (_, path) = self.file.keep().map_err(std::io::Error::from)?;
        Ok(path)
    }
}

/// Copy pages `[start, end]` (1-based, inclusive) of `source` into a new document.
///
/// `start` is clamped to at least 1 and `end` to the page count. An empty
/// result is not an error: it comes back with a [`RangeWarning`].
#[instrument(skip(source), fields(source_pages = source.page_count()))]
pub fn extract(source: &PdfDocument, start: u32, end: u32) -> Result<Extraction> {
    let requested = PageRange::new(start, end);
    let page_count = source.page_count();
    let src = source.inner();

    let mut target = Document::with_version(source.version());
    let pages_id = target.new_object_id();
    let mut kids = Vec::new();

    let warning = match requested.clamp(page_count) {
        Some((first, last)) => {
            info!(first, last, "Extracting page range");
            let pages = src.get_pages();
            let mut selected = Vec::new();
            for page_number in first..=last {
                let page_id = *pages.get(&page_number).ok_or_else(|| {
                    PrintwireError::DocumentLoad(format!(
                        "page {} not found during range extraction",
                        page_number
                    ))
                })?;
                selected.push(page_id);
            }

            let mut copier = PageCopier::new(src, &mut target, pages.values().copied(), &selected);
            for page_id in selected.iter().copied() {
                kids.push(Object::Reference(copier.copy_page(page_id, pages_id)?));
            }
            None
        }
        None => {
            let warning = RangeWarning {
                requested,
                page_count,
            };
            warn!(%warning, "Page range selects no pages; producing empty document");
            Some(warning)
        }
    };

    let copied = kids.len();
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => copied as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);

    debug!(copied, "Range extraction complete");
    Ok(Extraction {
        document: PdfDocument::from_document(target),
        warning,
    })
}

/// Load `source_path`, extract `range`, and write the result to a temporary
/// file in `temp_dir` (or the OS temp dir).
#[instrument(skip_all, fields(path = %source_path.display(), start = range.start, end = range.end))]
pub fn extract_to_temp(
    source_path: &Path,
    range: PageRange,
    temp_dir: Option<&Path>,
) -> Result<ExtractedFile> {
    let source = PdfDocument::open(source_path)?;
    let Extraction {
        mut document,
        warning,
    } = extract(&source, range.start, range.end)?;
    drop(source);

    let bytes = document.to_bytes()?;
    let mut builder = tempfile::Builder::new();
    let prefix = format!("page_range_{}_{}_", range.start, range.end);
    builder.prefix(&prefix).suffix(".pdf");
    let mut file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(&bytes)?;
    file.flush()?;

    info!(
        output = %file.path().display(),
        pages = document.page_count(),
        bytes = bytes.len(),
        "Extracted range written"
    );

    Ok(ExtractedFile {
        page_count: document.page_count(),
        file,
        warning,
    })
}

/// Copies page object graphs from one document into another.
///
/// Each source object is copied at most once, so shared resources (fonts,
/// images) stay shared in the target and reference cycles terminate.
/// References into the source page tree outside the selection (link
/// destinations, annotation `/P` entries, `/Pages` nodes) become `null`, so
/// unselected pages never travel with the copy.
struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    /// Every leaf page of the source.
    source_pages: HashSet<ObjectId>,
    selected: HashSet<ObjectId>,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    fn new(
        source: &'a Document,
        target: &'a mut Document,
        source_pages: impl IntoIterator<Item = ObjectId>,
        selected: &[ObjectId],
    ) -> Self {
        Self {
            source,
            target,
            source_pages: source_pages.into_iter().collect(),
            selected: selected.iter().copied().collect(),
            copied: HashMap::new(),
        }
    }

    /// Copy one page under `parent_id` and return its id in the target.
    fn copy_page(&mut self, page_id: ObjectId, parent_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            PrintwireError::DocumentLoad(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let new_id = self.copy_indirect(page_id);

        // Attributes the source page only had through its ancestors.
        let mut inherited = Vec::new();
        for key in INHERITABLE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                inherited.push((key.to_vec(), self.copy_object(value)));
            }
        }

        let page_dict = self
            .target
            .get_object_mut(new_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| {
                PrintwireError::DocumentLoad(format!("copied page {:?} is not a dictionary: {}", new_id, err))
            })?;
        page_dict.set("Parent", Object::Reference(parent_id));
        for (key, value) in inherited {
            page_dict.set(key, value);
        }

        Ok(new_id)
    }

    /// The target-side value of a reference to `id`.
    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if self.outside_selection(id) {
            return Object::Null;
        }
        Object::Reference(self.copy_indirect(id))
    }

    fn outside_selection(&self, id: ObjectId) -> bool {
        if self.selected.contains(&id) {
            return false;
        }
        if self.source_pages.contains(&id) {
            return true;
        }
        self.source
            .get_dictionary(id)
            .ok()
            .and_then(|dict| dict.get(b"Type").ok())
            .and_then(|kind| kind.as_name().ok())
            .is_some_and(|kind| kind == b"Pages")
    }

    /// Copy an indirect object (once) and return its id in the target.
    fn copy_indirect(&mut self, id: ObjectId) -> ObjectId {
        if let Some(&existing) = self.copied.get(&id) {
            return existing;
        }

        // Reserve the id first so cycles resolve to it.
        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);

        let is_page = self.selected.contains(&id);
        let cloned = match self.source.get_object(id) {
            // Pages are re-parented by `copy_page`.
            Ok(Object::Dictionary(dict)) if is_page => {
                Object::Dictionary(self.copy_dictionary(dict, Some(b"Parent".as_slice())))
            }
            Ok(object) => self.copy_object(object),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        self.target.objects.insert(new_id, cloned);
        new_id
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict, None)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Reference(id) => self.copy_reference(*id),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict, None);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            // Boolean, Integer, Real, String, Name and Null carry no references.
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary, skip: Option<&[u8]>) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if skip == Some(key.as_slice()) {
                continue;
            }
            let value = self.copy_object(value);
            copy.set(key.clone(), value);
        }
        copy
    }
}
