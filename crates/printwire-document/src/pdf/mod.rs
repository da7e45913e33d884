// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — loading, page-range extraction, and orientation detection.

pub mod document;
pub mod extract;
pub mod orientation;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use document::PdfDocument;
