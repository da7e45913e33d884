// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printwire dispatch pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, PrintwireError};

/// Correlation id for a single dispatch (one per print request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard paper sizes accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
    A5,
    F4,
}

impl PageSize {
    /// IPP `media` keyword (PWG 5101.1 self-describing name).
    pub fn ipp_media_keyword(&self) -> &'static str {
        match self {
            Self::A4 => "iso_a4_210x297mm",
            Self::Letter => "na_letter_8.5x11in",
            Self::Legal => "na_legal_8.5x14in",
            Self::A3 => "iso_a3_297x420mm",
            Self::A5 => "iso_a5_148x210mm",
            Self::F4 => "om_f4_210x330mm",
        }
    }

    /// Parse a page size name as sent by the host (case-insensitive).
    ///
    /// Unknown names fall back to A4; this never fails.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "letter" => Self::Letter,
            "legal" => Self::Legal,
            "a3" => Self::A3,
            "a5" => Self::A5,
            "f4" | "folio" => Self::F4,
            _ => Self::A4,
        }
    }
}

/// Page orientation as carried by IPP `orientation-requested`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
    ReversePortrait,
    ReverseLandscape,
    /// Any other enum value supplied verbatim by the caller.
    Other(i32),
}

impl Orientation {
    /// IPP `orientation-requested` enum value (RFC 8011 §5.2.10).
    pub fn ipp_enum_value(&self) -> i32 {
        match self {
            Self::Portrait => 3,
            Self::Landscape => 4,
            Self::ReverseLandscape => 5,
            Self::ReversePortrait => 6,
            Self::Other(value) => *value,
        }
    }

    /// Map a raw IPP enum value back to an orientation.
    pub fn from_ipp_enum(value: i32) -> Self {
        match value {
            3 => Self::Portrait,
            4 => Self::Landscape,
            5 => Self::ReverseLandscape,
            6 => Self::ReversePortrait,
            other => Self::Other(other),
        }
    }
}

/// Orientation as requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrientationMode {
    /// Infer from the first page's MediaBox.
    #[default]
    Auto,
    Explicit(Orientation),
}

impl OrientationMode {
    /// Host-side encoding: `-1` means auto, anything else is an IPP enum value.
    pub fn from_host_value(value: i32) -> Self {
        if value == -1 {
            Self::Auto
        } else {
            Self::Explicit(Orientation::from_ipp_enum(value))
        }
    }
}

/// IPP `print-color-mode` choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Monochrome,
    Color,
}

impl ColorMode {
    /// IPP `print-color-mode` keyword (PWG 5100.13).
    pub fn ipp_keyword(&self) -> &'static str {
        match self {
            Self::Monochrome => "monochrome",
            Self::Color => "color",
        }
    }

    /// Parse the host keyword. Anything that is not a colour keyword prints
    /// monochrome.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => Self::Color,
            _ => Self::Monochrome,
        }
    }
}

/// Duplex printing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplexMode {
    #[default]
    Simplex,
    LongEdge,
}

impl DuplexMode {
    /// IPP `sides` keyword (RFC 8011 §5.2.8).
    pub fn ipp_sides_keyword(&self) -> &'static str {
        match self {
            Self::Simplex => "one-sided",
            Self::LongEdge => "two-sided-long-edge",
        }
    }
}

impl From<bool> for DuplexMode {
    fn from(duplex: bool) -> Self {
        if duplex { Self::LongEdge } else { Self::Simplex }
    }
}

/// IPP `print-scaling` policy (PWG 5100.16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalingPolicy {
    /// Pages are sent unscaled (pre-extracted ranges).
    None,
    /// Printer fits each page to the media (whole-document jobs).
    AutoFit,
}

impl ScalingPolicy {
    pub fn ipp_keyword(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AutoFit => "auto-fit",
        }
    }
}

/// Inclusive, 1-based page range as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Clamp against a document of `page_count` pages.
    ///
    /// Returns `None` when the clamped range selects no pages.
    pub fn clamp(&self, page_count: u32) -> Option<(u32, u32)> {
        let start = self.start.max(1);
        let end = self.end.min(page_count);
        (start <= end).then_some((start, end))
    }
}

/// A fully typed print request, validated at the host boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintRequest {
    pub source_path: PathBuf,
    pub printer_address: String,
    pub orientation: OrientationMode,
    pub color_mode: ColorMode,
    pub duplex: bool,
    pub copies: i32,
    pub page_size: PageSize,
    pub page_range: Option<PageRange>,
}

impl PrintRequest {
    /// Request with the documented defaults: auto orientation, monochrome,
    /// simplex, one copy, A4, whole document.
    pub fn new(source_path: impl Into<PathBuf>, printer_address: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            printer_address: printer_address.into(),
            orientation: OrientationMode::Auto,
            color_mode: ColorMode::Monochrome,
            duplex: false,
            copies: 1,
            page_size: PageSize::A4,
            page_range: None,
        }
    }
}

/// Resolved job options handed to the attribute builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub copies: i32,
    pub duplex: DuplexMode,
    pub color_mode: ColorMode,
    pub orientation: Orientation,
    pub page_size: PageSize,
    pub scaling: ScalingPolicy,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            copies: 1,
            duplex: DuplexMode::Simplex,
            color_mode: ColorMode::Monochrome,
            orientation: Orientation::Portrait,
            page_size: PageSize::A4,
            scaling: ScalingPolicy::AutoFit,
        }
    }
}

/// Stages of the per-request dispatch state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStage {
    Received,
    Extracting,
    DetectingOrientation,
    Building,
    Submitting,
    Succeeded,
    Failed,
}

impl DispatchStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "validating request",
            Self::Extracting => "extracting page range",
            Self::DetectingOrientation => "detecting orientation",
            Self::Building => "building job attributes",
            Self::Submitting => "submitting to printer",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Details of a job the printer accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub request_id: RequestId,
    /// `job-id` assigned by the printer.
    pub job_id: i32,
    pub orientation: Orientation,
    /// Pages in the submitted payload, when known (i.e. after extraction).
    pub pages_submitted: Option<u32>,
    pub payload_bytes: u64,
    /// SHA-256 of the submitted payload, hex encoded.
    pub payload_sha256: String,
    pub submitted_at: DateTime<Utc>,
}

/// The single outcome reported to the host for one request.
#[derive(Debug, Clone)]
pub enum PrintOutcome {
    Succeeded(DispatchReport),
    Failed {
        kind: ErrorKind,
        stage: DispatchStage,
        message: String,
    },
}

impl PrintOutcome {
    /// Build a failure outcome whose message names the stage that failed.
    pub fn failed(stage: DispatchStage, err: &PrintwireError) -> Self {
        Self::Failed {
            kind: err.kind(),
            stage,
            message: format!("{stage}: {err}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn job_id(&self) -> Option<i32> {
        match self {
            Self::Succeeded(report) => Some(report.job_id),
            Self::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_keywords_cover_every_page_size() {
        let table = [
            (PageSize::A4, "iso_a4_210x297mm"),
            (PageSize::Letter, "na_letter_8.5x11in"),
            (PageSize::Legal, "na_legal_8.5x14in"),
            (PageSize::A3, "iso_a3_297x420mm"),
            (PageSize::A5, "iso_a5_148x210mm"),
            (PageSize::F4, "om_f4_210x330mm"),
        ];
        for (size, keyword) in table {
            assert_eq!(size.ipp_media_keyword(), keyword);
        }
    }

    #[test]
    fn unknown_page_size_falls_back_to_a4() {
        assert_eq!(PageSize::from_name("Tabloid"), PageSize::A4);
        assert_eq!(PageSize::from_name(""), PageSize::A4);
        assert_eq!(PageSize::from_name(" legal "), PageSize::Legal);
        assert_eq!(PageSize::from_name("F4"), PageSize::F4);
    }

    #[test]
    fn host_orientation_minus_one_is_auto() {
        assert_eq!(OrientationMode::from_host_value(-1), OrientationMode::Auto);
        assert_eq!(
            OrientationMode::from_host_value(4),
            OrientationMode::Explicit(Orientation::Landscape)
        );
        assert_eq!(
            OrientationMode::from_host_value(7),
            OrientationMode::Explicit(Orientation::Other(7))
        );
    }

    #[test]
    fn reverse_orientations_follow_rfc_8011() {
        assert_eq!(Orientation::ReverseLandscape.ipp_enum_value(), 5);
        assert_eq!(Orientation::ReversePortrait.ipp_enum_value(), 6);
        assert_eq!(Orientation::from_ipp_enum(5), Orientation::ReverseLandscape);
        assert_eq!(Orientation::from_ipp_enum(6), Orientation::ReversePortrait);
    }

    #[test]
    fn orientation_enum_values_roundtrip() {
        for value in 3..=6 {
            assert_eq!(Orientation::from_ipp_enum(value).ipp_enum_value(), value);
        }
    }

    #[test]
    fn duplex_bool_maps_to_sides_keyword() {
        assert_eq!(DuplexMode::from(true).ipp_sides_keyword(), "two-sided-long-edge");
        assert_eq!(DuplexMode::from(false).ipp_sides_keyword(), "one-sided");
    }

    #[test]
    fn colour_keyword_parsing() {
        assert_eq!(ColorMode::from_keyword("color"), ColorMode::Color);
        assert_eq!(ColorMode::from_keyword("Colour"), ColorMode::Color);
        assert_eq!(ColorMode::from_keyword("monochrome"), ColorMode::Monochrome);
        assert_eq!(ColorMode::from_keyword("sepia"), ColorMode::Monochrome);
    }

    #[test]
    fn page_range_clamps_to_document() {
        assert_eq!(PageRange::new(3, 5).clamp(10), Some((3, 5)));
        assert_eq!(PageRange::new(0, 50).clamp(10), Some((1, 10)));
        assert_eq!(PageRange::new(7, 3).clamp(10), None);
        assert_eq!(PageRange::new(12, 20).clamp(10), None);
    }

    #[test]
    fn failed_outcome_names_stage() {
        let err = PrintwireError::PrintTransport("connection refused".into());
        let outcome = PrintOutcome::failed(DispatchStage::Submitting, &err);
        match outcome {
            PrintOutcome::Failed { kind, stage, message } => {
                assert_eq!(kind, ErrorKind::PrintTransport);
                assert_eq!(stage, DispatchStage::Submitting);
                assert!(message.starts_with("submitting to printer: "));
            }
            PrintOutcome::Succeeded(_) => panic!("expected failure"),
        }
    }
}
