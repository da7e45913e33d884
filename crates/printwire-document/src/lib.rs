// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printwire-document — Document handling for the Printwire dispatch pipeline.
//
// Provides a narrow PDF page-table API over `lopdf`: loading, page geometry,
// copying a page range into a standalone document, and orientation inference
// from the first page's MediaBox.

pub mod pdf;

// Re-export the primary items so callers can use `printwire_document::PdfDocument` etc.
pub use pdf::document::{PageGeometry, PdfDocument};
pub use pdf::extract::{ExtractedFile, Extraction, RangeWarning, extract, extract_to_temp};
pub use pdf::orientation::{classify, detect, detect_file};
