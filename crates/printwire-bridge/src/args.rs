// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed arguments for the two print methods, and their conversion into a
// `PrintRequest`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use printwire_core::error::{PrintwireError, Result};
use printwire_core::types::{
    ColorMode, Orientation, OrientationMode, PageRange, PageSize, PrintRequest,
};

/// Arguments of `printPDF`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPdfArgs {
    pub file_path: Option<String>,
    pub ip: Option<String>,
    /// Raw IPP orientation enum; `-1` asks for detection.
    pub orientation: Option<i32>,
    pub color: Option<String>,
    pub duplex: Option<bool>,
    pub copies: Option<i32>,
    pub page_start: Option<i64>,
    pub page_end: Option<i64>,
    pub page_size: Option<String>,
}

/// Arguments of `printInvoicePdf`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceArgs {
    pub file_path: Option<String>,
    pub ip: Option<String>,
    pub orientation: Option<i32>,
    pub duplex: Option<bool>,
    pub page_size: Option<String>,
}

/// Deserialise call arguments; `null` means no arguments at all.
pub fn parse<T: DeserializeOwned + Default>(arguments: &Value) -> Result<T> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    T::deserialize(arguments)
        .map_err(|e| PrintwireError::MissingParameter(format!("invalid arguments: {e}")))
}

impl PrintPdfArgs {
    pub fn into_request(self) -> Result<PrintRequest> {
        let file_path = required(self.file_path, "filePath")?;
        let ip = required(self.ip, "ip")?;

        let mut request = PrintRequest::new(file_path, ip);
        request.orientation = OrientationMode::from_host_value(self.orientation.unwrap_or(-1));
        request.color_mode = self
            .color
            .as_deref()
            .map(ColorMode::from_keyword)
            .unwrap_or_default();
        request.duplex = self.duplex.unwrap_or(false);
        request.copies = self.copies.unwrap_or(1);
        request.page_size = self
            .page_size
            .as_deref()
            .map(PageSize::from_name)
            .unwrap_or_default();
        // A range applies only when both ends are given.
        request.page_range = match (self.page_start, self.page_end) {
            (Some(start), Some(end)) => Some(PageRange::new(to_page(start), to_page(end))),
            _ => None,
        };
        Ok(request)
    }
}

impl InvoiceArgs {
    /// `None` when `filePath` or `ip` is absent or blank.
    pub fn into_request(self) -> Option<PrintRequest> {
        let file_path = self.file_path.filter(|value| !value.trim().is_empty())?;
        let ip = self.ip.filter(|value| !value.trim().is_empty())?;

        let mut request = PrintRequest::new(file_path, ip);
        request.orientation = OrientationMode::from_host_value(
            self.orientation
                .unwrap_or(Orientation::Portrait.ipp_enum_value()),
        );
        request.duplex = self.duplex.unwrap_or(false);
        request.page_size = self
            .page_size
            .as_deref()
            .map(PageSize::from_name)
            .unwrap_or_default();
        Some(request)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| PrintwireError::MissingParameter(name.to_string()))
}

/// Page numbers below zero select nothing; above `u32::MAX` they saturate.
fn to_page(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_print_pdf_arguments() {
        let args: PrintPdfArgs = parse(&json!({
            "filePath": "/sdcard/report.pdf",
            "ip": "192.168.1.50",
            "orientation": 4,
            "color": "color",
            "duplex": true,
            "copies": 2,
            "pageStart": 3,
            "pageEnd": 5,
            "pageSize": "Letter"
        }))
        .unwrap();
        let request = args.into_request().unwrap();

        assert_eq!(request.source_path.to_str(), Some("/sdcard/report.pdf"));
        assert_eq!(request.printer_address, "192.168.1.50");
        assert_eq!(request.orientation, OrientationMode::Explicit(Orientation::Landscape));
        assert_eq!(request.color_mode, ColorMode::Color);
        assert!(request.duplex);
        assert_eq!(request.copies, 2);
        assert_eq!(request.page_range, Some(PageRange::new(3, 5)));
        assert_eq!(request.page_size, PageSize::Letter);
    }

    #[test]
    fn print_pdf_defaults() {
        let args: PrintPdfArgs = parse(&json!({
            "filePath": "/tmp/a.pdf",
            "ip": "10.0.0.9",
            "orientation": -1
        }))
        .unwrap();
        let request = args.into_request().unwrap();
        assert_eq!(request.orientation, OrientationMode::Auto);
        assert_eq!(request.color_mode, ColorMode::Monochrome);
        assert_eq!(request.copies, 1);
        assert_eq!(request.page_size, PageSize::A4);
        assert!(request.page_range.is_none());
    }

    #[test]
    fn half_a_range_is_ignored() {
        let args: PrintPdfArgs = parse(&json!({
            "filePath": "/tmp/a.pdf",
            "ip": "10.0.0.9",
            "pageStart": 2
        }))
        .unwrap();
        assert!(args.into_request().unwrap().page_range.is_none());
    }

    #[test]
    fn negative_pages_clamp_to_zero() {
        let args: PrintPdfArgs = parse(&json!({
            "filePath": "/tmp/a.pdf",
            "ip": "10.0.0.9",
            "pageStart": -3,
            "pageEnd": 2
        }))
        .unwrap();
        assert_eq!(
            args.into_request().unwrap().page_range,
            Some(PageRange::new(0, 2))
        );
    }

    #[test]
    fn print_pdf_requires_path_and_ip() {
        let args: PrintPdfArgs = parse(&json!({ "ip": "10.0.0.9" })).unwrap();
        assert!(matches!(
            args.into_request(),
            Err(PrintwireError::MissingParameter(name)) if name == "filePath"
        ));

        let args: PrintPdfArgs = parse(&json!({ "filePath": "/tmp/a.pdf", "ip": "" })).unwrap();
        assert!(matches!(
            args.into_request(),
            Err(PrintwireError::MissingParameter(name)) if name == "ip"
        ));
    }

    #[test]
    fn wrong_types_are_reported() {
        let result: Result<PrintPdfArgs> = parse(&json!({ "filePath": 12 }));
        assert!(matches!(result, Err(PrintwireError::MissingParameter(_))));
    }

    #[test]
    fn null_arguments_parse_as_empty() {
        let args: InvoiceArgs = parse(&Value::Null).unwrap();
        assert!(args.into_request().is_none());
    }

    #[test]
    fn invoice_defaults_to_explicit_portrait() {
        let args: InvoiceArgs = parse(&json!({
            "filePath": "/tmp/invoice.pdf",
            "ip": "192.168.1.50"
        }))
        .unwrap();
        let request = args.into_request().unwrap();
        assert_eq!(request.orientation, OrientationMode::Explicit(Orientation::Portrait));
        assert!(!request.duplex);
        assert_eq!(request.page_size, PageSize::A4);
        assert_eq!(request.copies, 1);
    }

    #[test]
    fn invoice_missing_ip_is_none() {
        let args: InvoiceArgs = parse(&json!({ "filePath": "/tmp/invoice.pdf" })).unwrap();
        assert!(args.into_request().is_none());
    }
}
