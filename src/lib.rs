//! # fattura
//!
//! Invoicing for a small Italian practice: a client/supplier registry,
//! `FT<year><seq>` numbering, VAT totals, a Draft → Created → Sent
//! lifecycle, a PDF courtesy copy, a draft FatturaPA XML and period
//! summaries, with optional best-effort sync of flat tables.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fattura::core::*;
//! use rust_decimal_macros::dec;
//!
//! let issuer = Issuer::new(
//!     "Studio Bianchi",
//!     "01234567890",
//!     AddressBuilder::new("Milano", "20121", "MI").street("Via Roma 1").build(),
//! );
//! let mut session = Session::new(issuer, SessionConfig::default());
//!
//! let draft = InvoiceDraft {
//!     counterparty: "Acme Srl".into(),
//!     counterparty_details: ContactDetailsBuilder::new().vat_number("09876543210").build(),
//!     lines: vec![
//!         InvoiceLine::new("Consulenza", dec!(2), dec!(100), VatRate::Standard),
//!         InvoiceLine::new("Trasferta", dec!(1), dec!(50), VatRate::Standard),
//!     ],
//!     ..Default::default()
//! };
//! let id = session.create_invoice(draft, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()).unwrap();
//!
//! let invoice = session.invoice(id).unwrap();
//! assert_eq!(invoice.number, "FT2025001");
//! assert_eq!(format_eur(invoice.totals.total), "305,00");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, registry, numbering, totals, lifecycle, session, flat tables |
//! | `pdf` | Courtesy-copy PDF rendering |
//! | `fatturapa` | Draft FatturaPA (FPR12) XML rendering |
//! | `report` | Monthly, quarterly and annual summaries |
//! | `sync` | Best-effort remote sync of flat tables |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(feature = "fatturapa")]
pub mod fatturapa;

#[cfg(feature = "report")]
pub mod report;

#[cfg(feature = "sync")]
pub mod sync;
