// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print-Job attribute set for one request.

use ipp::prelude::{IppAttribute, IppValue};
use printwire_core::types::PrintOptions;

/// Only PDF is ever submitted.
pub const DOCUMENT_FORMAT_PDF: &str = "application/pdf";

/// IPP `print-quality` enum value for `high` (RFC 8011 SS5.2.13).
pub const PRINT_QUALITY_HIGH: i32 = 5;

/// The nine job attributes sent with every Print-Job.
///
/// Pure: the same options always give the same attributes in the same order.
pub fn build(options: &PrintOptions, job_name: &str) -> Vec<IppAttribute> {
    vec![
        IppAttribute::new(
            "job-name",
            IppValue::NameWithoutLanguage(job_name.to_owned().into()),
        ),
        IppAttribute::new(
            "document-format",
            IppValue::MimeMediaType(DOCUMENT_FORMAT_PDF.to_owned().into()),
        ),
        IppAttribute::new("copies", IppValue::Integer(options.copies.max(1))),
        keyword("sides", options.duplex.ipp_sides_keyword()),
        IppAttribute::new(
            "orientation-requested",
            IppValue::Enum(options.orientation.ipp_enum_value()),
        ),
        keyword("print-color-mode", options.color_mode.ipp_keyword()),
        IppAttribute::new("print-quality", IppValue::Enum(PRINT_QUALITY_HIGH)),
        keyword("media", options.page_size.ipp_media_keyword()),
        keyword("print-scaling", options.scaling.ipp_keyword()),
    ]
}

fn keyword(name: &str, value: &str) -> IppAttribute {
    IppAttribute::new(name, IppValue::Keyword(value.to_owned().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use printwire_core::types::{ColorMode, DuplexMode, Orientation, PageSize, ScalingPolicy};

    /// Value of `name`, as the printer would read it.
    fn value(attrs: &[IppAttribute], name: &str) -> String {
        attrs
            .iter()
            .find(|attr| attr.name() == name)
            .map(|attr| attr.value().to_string())
            .unwrap_or_else(|| panic!("{name} missing"))
    }

    fn find<'a>(attrs: &'a [IppAttribute], name: &str) -> &'a IppValue {
        attrs
            .iter()
            .find(|attr| attr.name() == name)
            .map(IppAttribute::value)
            .unwrap_or_else(|| panic!("{name} missing"))
    }

    #[test]
    fn always_nine_attributes() {
        let attrs = build(&PrintOptions::default(), "IPP_Print_PDF");
        let names: Vec<&str> = attrs.iter().map(|attr| attr.name()).collect();
        assert_eq!(
            names,
            [
                "job-name",
                "document-format",
                "copies",
                "sides",
                "orientation-requested",
                "print-color-mode",
                "print-quality",
                "media",
                "print-scaling",
            ]
        );
    }

    #[test]
    fn defaults() {
        let attrs = build(&PrintOptions::default(), "IPP_Print_PDF");
        assert_eq!(value(&attrs, "job-name"), "IPP_Print_PDF");
        assert_eq!(value(&attrs, "document-format"), "application/pdf");
        assert_eq!(value(&attrs, "copies"), "1");
        assert_eq!(value(&attrs, "sides"), "one-sided");
        assert_eq!(value(&attrs, "orientation-requested"), "3");
        assert_eq!(value(&attrs, "print-color-mode"), "monochrome");
        assert_eq!(value(&attrs, "media"), "iso_a4_210x297mm");
        assert_eq!(value(&attrs, "print-scaling"), "auto-fit");
    }

    #[test]
    fn value_types() {
        let attrs = build(&PrintOptions::default(), "IPP_Print_PDF");
        assert!(matches!(find(&attrs, "print-quality"), IppValue::Enum(5)));
        assert!(matches!(find(&attrs, "orientation-requested"), IppValue::Enum(3)));
        assert!(matches!(find(&attrs, "copies"), IppValue::Integer(1)));
        assert!(matches!(find(&attrs, "sides"), IppValue::Keyword(_)));
        assert!(matches!(find(&attrs, "job-name"), IppValue::NameWithoutLanguage(_)));
        assert!(matches!(find(&attrs, "document-format"), IppValue::MimeMediaType(_)));
    }

    #[test]
    fn options_flow_through() {
        let options = PrintOptions {
            copies: 3,
            duplex: DuplexMode::LongEdge,
            color_mode: ColorMode::Color,
            orientation: Orientation::Landscape,
            page_size: PageSize::Letter,
            scaling: ScalingPolicy::None,
        };
        let attrs = build(&options, "Invoices");
        assert_eq!(value(&attrs, "job-name"), "Invoices");
        assert_eq!(value(&attrs, "copies"), "3");
        assert_eq!(value(&attrs, "sides"), "two-sided-long-edge");
        assert_eq!(value(&attrs, "orientation-requested"), "4");
        assert_eq!(value(&attrs, "print-color-mode"), "color");
        assert_eq!(value(&attrs, "media"), "na_letter_8.5x11in");
        assert_eq!(value(&attrs, "print-scaling"), "none");
    }

    #[test]
    fn non_positive_copies_become_one() {
        for copies in [0, -4, i32::MIN] {
            let options = PrintOptions {
                copies,
                ..PrintOptions::default()
            };
            assert!(matches!(find(&build(&options, "x"), "copies"), IppValue::Integer(1)));
        }
    }

    #[test]
    fn raw_orientation_is_passed_through() {
        let options = PrintOptions {
            orientation: Orientation::Other(7),
            ..PrintOptions::default()
        };
        let attrs = build(&options, "x");
        assert!(matches!(find(&attrs, "orientation-requested"), IppValue::Enum(7)));
    }

    #[test]
    fn build_is_deterministic() {
        let options = PrintOptions {
            copies: 2,
            page_size: PageSize::F4,
            ..PrintOptions::default()
        };
        let render = |attrs: Vec<IppAttribute>| -> Vec<(String, String)> {
            attrs
                .iter()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect()
        };
        assert_eq!(render(build(&options, "x")), render(build(&options, "x")));
    }
}
