//! Draft FatturaPA XML.
//!
//! Produces an FPR12 (private-sector) document for preview and archiving.
//! Transmission to SdI is out of scope, so the output is never signed or
//! schema-validated.
//!
//! # Example
//!
//! ```no_run
//! use fattura::core::*;
//! use fattura::fatturapa;
//!
//! let session: Session = todo!();
//! let id: InvoiceId = todo!();
//! let xml = fatturapa::render_draft_xml(
//!     session.invoice(id).unwrap(),
//!     session.issuer(),
//!     session.counterparty_of(id).unwrap(),
//! )
//! .unwrap();
//! ```

mod draft;
pub(crate) mod xml_utils;

pub use draft::render_draft_xml;

/// Transmission format for invoices between private parties.
pub const FORMATO_TRASMISSIONE: &str = "FPR12";

/// Leading comment of every rendered document.
pub const DRAFT_NOTICE: &str = "BOZZA: documento generato a scopo di anteprima, non validato e non trasmesso allo SdI";

/// Namespace URIs.
pub mod ns {
    pub const FATTURA: &str = "http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
    pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
}
