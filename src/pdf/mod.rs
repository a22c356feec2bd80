//! PDF courtesy copy (copia di cortesia).
//!
//! A4 pages drawn with the standard Helvetica fonts: issuer header,
//! counterparty block, document and transmission data, line items with page
//! breaks, totals, VAT summary and payment terms. Every page carries the
//! notice that the copy has no legal or fiscal value.
//!
//! Output is deterministic: no timestamps, no compression, so the same
//! invoice always renders to the same bytes.

mod canvas;
mod layout;

use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};

use crate::core::{Contact, FatturaError, Invoice, Issuer, validate_issuer};
use canvas::{Font, PAGE_HEIGHT, PAGE_WIDTH};

/// Notice printed at the bottom of every page.
pub const COURTESY_COPY_NOTICE: &str = "Copia di cortesia priva di valore legale e fiscale ai sensi dell'art. 21 D.P.R. 633/72. L'originale del documento elettronico è disponibile nell'area riservata del sito web dell'Agenzia delle Entrate.";

/// [`COURTESY_COPY_NOTICE`] one sentence per line.
const NOTICE_SENTENCES: [&str; 2] = [
    "Copia di cortesia priva di valore legale e fiscale ai sensi dell'art. 21 D.P.R. 633/72.",
    "L'originale del documento elettronico è disponibile nell'area riservata del sito web dell'Agenzia delle Entrate.",
];

/// Render the courtesy copy of `invoice`.
///
/// Totals are printed as stored on the invoice. The function is pure;
/// writing the bytes somewhere is up to the caller (see
/// [`Session::attach_pdf`](crate::core::Session::attach_pdf)).
pub fn render_pdf(
    invoice: &Invoice,
    issuer: &Issuer,
    counterparty: &Contact,
) -> Result<Vec<u8>, FatturaError> {
    let issuer_errors = validate_issuer(issuer);
    if !issuer_errors.is_empty() {
        return Err(FatturaError::from_validation(&issuer_errors));
    }

    let pages = layout::draw_invoice(invoice, issuer, counterparty)?;
    let bytes = assemble(pages)?;
    tracing::debug!(number = %invoice.number, bytes = bytes.len(), "courtesy PDF rendered");
    Ok(bytes)
}

fn assemble(pages: Vec<Vec<lopdf::content::Operation>>) -> Result<Vec<u8>, FatturaError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| FatturaError::Pdf(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| FatturaError::Pdf(format!("failed to write PDF: {e}")))?;
    Ok(buf)
}
