// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orientation inference from the first page's MediaBox.

use std::path::Path;

use printwire_core::error::{PrintwireError, Result};
use printwire_core::types::Orientation;
use tracing::{debug, instrument};

use super::document::{PageGeometry, PdfDocument};

/// Landscape when strictly wider than tall, portrait otherwise (square
/// pages included).
pub fn classify(geometry: PageGeometry) -> Orientation {
    if geometry.width > geometry.height {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

/// Orientation of the document's first page. Page rotation is ignored.
pub fn detect(document: &PdfDocument) -> Result<Orientation> {
    if document.page_count() == 0 {
        return Err(PrintwireError::DocumentLoad(
            "document has no pages to detect orientation from".into(),
        ));
    }
    let geometry = document.page_geometry(1)?;
    let orientation = classify(geometry);
    debug!(
        width = geometry.width,
        height = geometry.height,
        ?orientation,
        "Detected orientation"
    );
    Ok(orientation)
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn detect_file(path: impl AsRef<Path>) -> Result<Orientation> {
    let document = PdfDocument::open(path)?;
    detect(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::extract::extract;
    use crate::pdf::fixtures;

    fn detect_bytes(bytes: &[u8]) -> Result<Orientation> {
        detect(&PdfDocument::from_bytes(bytes).unwrap())
    }

    #[test]
    fn a4_portrait() {
        let bytes = fixtures::uniform_pdf(1, 595.0, 842.0);
        assert_eq!(detect_bytes(&bytes).unwrap(), Orientation::Portrait);
    }

    #[test]
    fn a4_landscape() {
        let bytes = fixtures::uniform_pdf(1, 842.0, 595.0);
        assert_eq!(detect_bytes(&bytes).unwrap(), Orientation::Landscape);
    }

    #[test]
    fn square_page_is_portrait() {
        assert_eq!(
            classify(PageGeometry { width: 600.0, height: 600.0 }),
            Orientation::Portrait
        );
    }

    #[test]
    fn only_the_first_page_counts() {
        let bytes = fixtures::pdf_with_pages(&[(595.0, 842.0), (842.0, 595.0), (842.0, 595.0)]);
        assert_eq!(detect_bytes(&bytes).unwrap(), Orientation::Portrait);
    }

    #[test]
    fn inherited_media_box_is_used() {
        let bytes = fixtures::pdf_with_inherited_media_box(2, 1008.0, 612.0);
        assert_eq!(detect_bytes(&bytes).unwrap(), Orientation::Landscape);
    }

    #[test]
    fn empty_document_is_a_load_error() {
        let source = PdfDocument::from_bytes(&fixtures::uniform_pdf(3, 595.0, 842.0)).unwrap();
        let empty = extract(&source, 3, 1).unwrap().document;
        assert!(matches!(detect(&empty), Err(PrintwireError::DocumentLoad(_))));
    }

    #[test]
    fn detects_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.pdf");
        std::fs::write(&path, fixtures::uniform_pdf(1, 842.0, 595.0)).unwrap();
        assert_eq!(detect_file(&path).unwrap(), Orientation::Landscape);
    }
}
