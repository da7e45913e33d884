// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people at the printer, not developers.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the host presents it.

use crate::error::PrintwireError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy printer; trying again may work.
    Transient,
    /// User must do something (fix the address, pick another file, add paper).
    ActionRequired,
    /// Cannot be fixed by trying again.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `PrintwireError` into a `HumanError`.
pub fn humanize_error(err: &PrintwireError) -> HumanError {
    match err {
        PrintwireError::MissingParameter(field) => HumanError {
            message: "Some print details are missing.".into(),
            suggestion: format!("Choose a document and a printer, then try again. (Missing: {field})"),
            severity: Severity::ActionRequired,
        },

        PrintwireError::DocumentLoad(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or empty. Try opening it on a computer first, or pick a different file.".into(),
            severity: Severity::Permanent,
        },

        PrintwireError::InvalidRange { page_count, .. } => HumanError {
            message: "Those pages aren't in this document.".into(),
            suggestion: format!("Pick a page range between 1 and {page_count}, with the first page before the last."),
            severity: Severity::ActionRequired,
        },

        PrintwireError::PrintTransport(detail) => humanize_transport_error(detail),

        PrintwireError::Io(_) => HumanError {
            message: "We couldn't prepare the pages for printing.".into(),
            suggestion: "Your device may be low on storage. Free up some space and try again.".into(),
            severity: Severity::Transient,
        },

        PrintwireError::Serialization(_) | PrintwireError::Config(_) => HumanError {
            message: "The print settings file couldn't be read.".into(),
            suggestion: "Check the settings file for typos, or remove it to use the defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Parse transport/IPP failure details into human-readable messages.
fn humanize_transport_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError {
            message: "The printer didn't respond in time.".into(),
            suggestion: "The printer might be busy or turned off. Check it's on and connected, then try again.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("connection refused") {
        HumanError {
            message: "The printer refused our connection.".into(),
            suggestion: "The printer may be turned off or not accepting network print jobs. Try turning it off and on again.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("connection reset") || lower.contains("broken pipe") {
        HumanError {
            message: "The connection to the printer was interrupted.".into(),
            suggestion: "This sometimes happens with Wi-Fi. Please try again.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("invalid printer address") {
        HumanError {
            message: "The printer address doesn't look right.".into(),
            suggestion: "Check the printer address and try again. It should look like 192.168.1.100.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("client-error-document-format") {
        HumanError {
            message: "The printer doesn't understand this file type.".into(),
            suggestion: "This printer may not print PDF files directly.".into(),
            severity: Severity::Permanent,
        }
    } else if lower.contains("client-error-attributes") || lower.contains("client-error-not-possible") {
        HumanError {
            message: "The printer can't handle those settings.".into(),
            suggestion: "Try changing the print settings (paper size, duplex, colour) and print again.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("server-error") {
        HumanError {
            message: "The printer reported an internal error.".into(),
            suggestion: "Try turning the printer off, waiting 10 seconds, and turning it back on.".into(),
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "The printer had a problem.".into(),
            suggestion: format!("Try again. If this keeps happening, turn the printer off and on again. (Detail: {detail})"),
            severity: Severity::Transient,
        }
    }
}
