// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic PDFs for tests. Every page carries a distinct content stream
// (see `page_label`) so copies can be matched back to their source page.

use lopdf::{Document, Object, Stream, dictionary};

/// Content stream drawn on page `n` of every fixture.
pub fn page_label(n: u32) -> Vec<u8> {
    format!("BT /F1 24 Tf 72 720 Td (Page {n}) Tj ET").into_bytes()
}

/// A PDF whose pages all share one size.
pub fn uniform_pdf(page_count: u32, width: f32, height: f32) -> Vec<u8> {
    let sizes: Vec<(f32, f32)> = (0..page_count).map(|_| (width, height)).collect();
    pdf_with_pages(&sizes)
}

/// A PDF with one page per `(width, height)` entry, MediaBox set on each page.
pub fn pdf_with_pages(sizes: &[(f32, f32)]) -> Vec<u8> {
    build(sizes.len() as u32, |page| Some(sizes[page as usize - 1]), None)
}

/// A PDF whose pages carry no MediaBox of their own; it is inherited from
/// the root `/Pages` node.
pub fn pdf_with_inherited_media_box(page_count: u32, width: f32, height: f32) -> Vec<u8> {
    build(page_count, |_| None, Some((width, height)))
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![0.into(), 0.into(), width.into(), height.into()])
}

fn build(
    page_count: u32,
    page_size: impl Fn(u32) -> Option<(f32, f32)>,
    inherited_size: Option<(f32, f32)>,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for n in 1..=page_count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_label(n)));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if let Some((width, height)) = page_size(n) {
            page.set("MediaBox", media_box(width, height));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => resources_id,
    };
    if let Some((width, height)) = inherited_size {
        pages.set("MediaBox", media_box(width, height));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("fixture PDF serialises");
    output
}
