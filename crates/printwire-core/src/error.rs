// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printwire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Printwire operations.
#[derive(Debug, Error)]
pub enum PrintwireError {
    // -- Request validation --
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    // -- Document errors --
    #[error("PDF could not be loaded: {0}")]
    DocumentLoad(String),

    #[error("page range {start}-{end} selects no pages (document has {page_count})")]
    InvalidRange {
        start: u32,
        end: u32,
        page_count: u32,
    },

    // -- Print errors --
    #[error("print transport failed: {0}")]
    PrintTransport(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PrintwireError {
    /// The boundary-level error kind this error is reported as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter(_) | Self::Config(_) => ErrorKind::MissingParameter,
            Self::DocumentLoad(_) => ErrorKind::DocumentLoad,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::PrintTransport(_) => ErrorKind::PrintTransport,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Io,
        }
    }
}

/// Error kinds reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required request field was absent.
    MissingParameter,
    /// The PDF could not be parsed or has no pages.
    DocumentLoad,
    /// A temporary file could not be written or read back.
    Io,
    /// Network or protocol failure while talking to the printer.
    PrintTransport,
    /// The page range selected nothing (warning level).
    InvalidRange,
}

impl ErrorKind {
    /// Stable code used in host-facing error replies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::DocumentLoad => "DOCUMENT_LOAD_ERROR",
            Self::Io => "IO_ERROR",
            Self::PrintTransport => "PRINT_TRANSPORT_ERROR",
            Self::InvalidRange => "INVALID_RANGE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintwireError>;
