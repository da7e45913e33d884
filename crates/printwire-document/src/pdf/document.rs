// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document — open a PDF, enumerate its pages, and read page geometry
// using the `lopdf` crate.

use std::io;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use printwire_core::error::{PrintwireError, Result};
use tracing::{debug, info, instrument};

/// Page-tree walks give up after this many `/Parent` hops.
const MAX_TREE_DEPTH: usize = 64;

/// Width and height of a page's MediaBox, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
}

/// An open PDF document.
///
/// Owns the parsed object graph; dropping it releases the document.
pub struct PdfDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PrintwireError::DocumentLoad(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Load a PDF from raw bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PrintwireError::DocumentLoad(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    /// Wrap a document assembled in memory (e.g. by the extractor).
    pub(crate) fn from_document(document: Document) -> Self {
        Self {
            document,
            source_path: None,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Return the source path if the document was created via [`PdfDocument::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// PDF version from the file header.
    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// MediaBox size of a page (1-indexed), following page-tree inheritance.
    pub fn page_geometry(&self, page_number: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(page_number)?;
        let media_box = inherited_attribute(&self.document, page_id, b"MediaBox")
            .ok_or_else(|| {
                PrintwireError::DocumentLoad(format!("page {page_number} has no MediaBox"))
            })?;
        geometry_from_box(&self.document, media_box)
            .map_err(|msg| PrintwireError::DocumentLoad(format!("page {page_number}: {msg}")))
    }

    /// Decoded content stream(s) of a page (1-indexed).
    pub fn page_content(&self, page_number: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(page_number)?;
        self.document.get_page_content(page_id).map_err(|err| {
            PrintwireError::DocumentLoad(format!("page {page_number} content unreadable: {err}"))
        })
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| io::Error::other(format!("failed to serialise PDF: {err}")))?;
        Ok(output)
    }

    // -- Crate internals ------------------------------------------------------

    pub(crate) fn inner(&self) -> &Document {
        &self.document
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            PrintwireError::DocumentLoad(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }
}

/// Look up `key` on a page dictionary, walking up `/Parent` links when the
/// page inherits it (PDF 32000-1 §7.7.3.4).
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Follow a single indirect reference, if any.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> std::result::Result<&'a Object, String> {
    match object {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|err| format!("dangling reference {id:?}: {err}")),
        other => Ok(other),
    }
}

/// Interpret a `[llx lly urx ury]` rectangle as width and height.
fn geometry_from_box(doc: &Document, object: &Object) -> std::result::Result<PageGeometry, String> {
    let array = resolve(doc, object)?
        .as_array()
        .map_err(|_| "MediaBox is not an array".to_string())?;
    if array.len() != 4 {
        return Err(format!("MediaBox has {} entries, expected 4", array.len()));
    }

    let mut coords = [0.0f32; 4];
    for (slot, entry) in coords.iter_mut().zip(array) {
        *slot = resolve(doc, entry)?
            .as_float()
            .map_err(|_| "MediaBox entry is not a number".to_string())?;
    }

    let [llx, lly, urx, ury] = coords;
    Ok(PageGeometry {
        width: (urx - llx).abs(),
        height: (ury - lly).abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;

    #[test]
    fn counts_pages() {
        let bytes = fixtures::uniform_pdf(4, 595.0, 842.0);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 4);
        assert!(doc.source_path().is_none());
    }

    #[test]
    fn reads_direct_media_box() {
        let bytes = fixtures::pdf_with_pages(&[(842.0, 595.0), (595.0, 842.0)]);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(
            doc.page_geometry(1).unwrap(),
            PageGeometry { width: 842.0, height: 595.0 }
        );
        assert_eq!(
            doc.page_geometry(2).unwrap(),
            PageGeometry { width: 595.0, height: 842.0 }
        );
    }

    #[test]
    fn reads_inherited_media_box() {
        let bytes = fixtures::pdf_with_inherited_media_box(3, 612.0, 792.0);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(
            doc.page_geometry(3).unwrap(),
            PageGeometry { width: 612.0, height: 792.0 }
        );
    }

    #[test]
    fn page_out_of_range_is_a_load_error() {
        let bytes = fixtures::uniform_pdf(2, 595.0, 842.0);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert!(matches!(
            doc.page_geometry(3),
            Err(PrintwireError::DocumentLoad(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let result = PdfDocument::from_bytes(b"this is not a pdf");
        assert!(matches!(result, Err(PrintwireError::DocumentLoad(_))));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let result = PdfDocument::open("/nonexistent/printwire/input.pdf");
        assert!(matches!(result, Err(PrintwireError::DocumentLoad(_))));
    }

    #[test]
    fn page_content_is_readable() {
        let bytes = fixtures::uniform_pdf(2, 595.0, 842.0);
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_content(2).unwrap(), fixtures::page_label(2));
    }
}
