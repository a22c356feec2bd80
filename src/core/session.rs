//! Application state: issuer profile, registry, document store and the
//! actions a user can take on them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::builder::InvoiceBuilder;
use super::error::FatturaError;
use super::lifecycle::{InvoiceState, Transition};
use super::numbering::next_invoice_number;
use super::registry::ContactRegistry;
use super::store::DocumentStore;
use super::tax::STAMP_DUTY_AMOUNT;
use super::types::*;
use super::validation::{validate_counterparty, validate_invoice};

/// Maximum number of lines accepted on one invoice.
pub const MAX_LINES: usize = 1_000;

/// Session-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory where rendered courtesy copies are written.
    pub pdf_dir: PathBuf,
    /// Amount added when an invoice carries stamp duty.
    pub stamp_duty_amount: Decimal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("fatture_pdf"),
            stamp_duty_amount: STAMP_DUTY_AMOUNT,
        }
    }
}

/// The invoice form: everything a user enters to create or edit an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub doc_type: DocumentType,
    /// Counterparty denomination; also the registry key.
    pub counterparty: String,
    pub counterparty_details: ContactDetails,
    pub lines: Vec<InvoiceLine>,
    pub notes: Option<String>,
    pub payment: Payment,
    /// Apply the flat stamp duty (bollo virtuale).
    pub stamp_duty: bool,
    /// Defaults to the creation day.
    pub issue_date: Option<NaiveDate>,
}

/// All state of one running application, owned by the caller.
///
/// Mutating operations take `&mut self`, so assigning a number and
/// appending the invoice happen under one exclusive borrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    issuer: Issuer,
    config: SessionConfig,
    contacts: ContactRegistry,
    documents: DocumentStore,
}

impl Session {
    pub fn new(issuer: Issuer, config: SessionConfig) -> Self {
        Self {
            issuer,
            config,
            contacts: ContactRegistry::new(),
            documents: DocumentStore::new(),
        }
    }

    /// Restore a session from previously persisted parts.
    pub fn from_parts(
        issuer: Issuer,
        config: SessionConfig,
        contacts: ContactRegistry,
        documents: DocumentStore,
    ) -> Self {
        Self {
            issuer,
            config,
            contacts,
            documents,
        }
    }

    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    pub fn set_issuer(&mut self, issuer: Issuer) {
        self.issuer = issuer;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn contacts(&self) -> &ContactRegistry {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut ContactRegistry {
        &mut self.contacts
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn invoice(&self, id: InvoiceId) -> Result<&Invoice, FatturaError> {
        self.documents
            .get(id)
            .ok_or_else(|| FatturaError::NotFound(format!("invoice {id}")))
    }

    /// Registry contact an invoice is addressed to.
    pub fn counterparty_of(&self, id: InvoiceId) -> Result<&Contact, FatturaError> {
        let invoice = self.invoice(id)?;
        self.contacts.get(invoice.counterparty).ok_or_else(|| {
            FatturaError::NotFound(format!(
                "contact {} for invoice {}",
                invoice.counterparty, invoice.number
            ))
        })
    }

    /// Validate the form, upsert the counterparty, assign the next number
    /// and store the invoice as Draft. A rejected draft changes nothing.
    pub fn create_invoice(
        &mut self,
        draft: InvoiceDraft,
        today: NaiveDate,
    ) -> Result<InvoiceId, FatturaError> {
        let number = next_invoice_number(self.documents.numbers(), today);
        let issue_date = draft.issue_date.unwrap_or(today);
        let mut invoice = self.checked_invoice(&draft, number, issue_date)?;

        invoice.counterparty = self
            .contacts
            .upsert(&draft.counterparty, draft.counterparty_details)?;
        let number = invoice.number.clone();
        let total = invoice.totals.total;
        let id = self.documents.insert(invoice);
        tracing::info!(invoice_id = %id, number = %number, %total, "invoice created");
        Ok(id)
    }

    /// Copy an invoice under a fresh number dated `today`. The copy starts
    /// as Draft without PDF or UUID; the original is untouched.
    pub fn duplicate(&mut self, id: InvoiceId, today: NaiveDate) -> Result<InvoiceId, FatturaError> {
        let mut copy = self.invoice(id)?.clone();
        copy.number = next_invoice_number(self.documents.numbers(), today);
        copy.issue_date = today;
        copy.state = InvoiceState::Draft;
        copy.pdf_path = None;
        copy.uuid = None;

        let number = copy.number.clone();
        let new_id = self.documents.insert(copy);
        tracing::info!(source = %id, invoice_id = %new_id, number = %number, "invoice duplicated");
        Ok(new_id)
    }

    /// Remove an invoice permanently.
    pub fn delete(&mut self, id: InvoiceId) -> Result<Invoice, FatturaError> {
        let removed = self
            .documents
            .remove(id)
            .ok_or_else(|| FatturaError::NotFound(format!("invoice {id}")))?;
        tracing::info!(invoice_id = %id, number = %removed.number, "invoice deleted");
        Ok(removed)
    }

    /// Form pre-filled from a stored invoice.
    pub fn draft_for(&self, id: InvoiceId) -> Result<InvoiceDraft, FatturaError> {
        let invoice = self.invoice(id)?;
        let counterparty_details = self
            .contacts
            .get(invoice.counterparty)
            .map(Contact::details)
            .unwrap_or_default();
        Ok(InvoiceDraft {
            doc_type: invoice.doc_type,
            counterparty: invoice.counterparty_name.clone(),
            counterparty_details,
            lines: invoice.lines.clone(),
            notes: invoice.notes.clone(),
            payment: invoice.payment.clone(),
            stamp_duty: !invoice.totals.stamp_duty.is_zero(),
            issue_date: Some(invoice.issue_date),
        })
    }

    /// Replace the content of an invoice and recompute its totals.
    ///
    /// Number, id and UUID are kept. The attached PDF no longer matches the
    /// content, so its path is dropped and a Created invoice returns to
    /// Draft until a fresh PDF is attached. Sent invoices are read-only.
    pub fn edit(&mut self, id: InvoiceId, draft: InvoiceDraft) -> Result<(), FatturaError> {
        let current = self.invoice(id)?;
        if !current.state.is_editable() {
            return Err(FatturaError::Lifecycle(format!(
                "invoice {} is {} and cannot be edited",
                current.number,
                current.state.label()
            )));
        }
        let number = current.number.clone();
        let issue_date = draft.issue_date.unwrap_or(current.issue_date);
        let mut updated = self.checked_invoice(&draft, number, issue_date)?;

        updated.counterparty = self
            .contacts
            .upsert(&draft.counterparty, draft.counterparty_details)?;
        let slot = self
            .documents
            .get_mut(id)
            .ok_or_else(|| FatturaError::NotFound(format!("invoice {id}")))?;
        updated.state = match slot.state {
            InvoiceState::Created => InvoiceState::Draft,
            state => state,
        };
        updated.uuid = slot.uuid;
        if let Some(stale) = slot.pdf_path.take() {
            tracing::debug!(invoice_id = %id, path = %stale.display(), "PDF detached after edit");
        }
        *slot = updated;
        tracing::info!(invoice_id = %id, number = %slot.number, state = slot.state.label(), "invoice updated");
        Ok(())
    }

    /// Move an invoice to `target`. Leaving Sent requires
    /// [`Transition::Confirmed`].
    pub fn set_state(
        &mut self,
        id: InvoiceId,
        target: InvoiceState,
        how: Transition,
    ) -> Result<InvoiceState, FatturaError> {
        let invoice = self
            .documents
            .get_mut(id)
            .ok_or_else(|| FatturaError::NotFound(format!("invoice {id}")))?;
        let next = invoice.state.transition(target, how)?;
        if next != invoice.state {
            tracing::info!(
                number = %invoice.number,
                from = %invoice.state,
                to = %next,
                "invoice state changed"
            );
        }
        invoice.state = next;
        Ok(next)
    }

    /// Write a rendered courtesy copy under the configured directory and
    /// record its path on the invoice.
    pub fn attach_pdf(&mut self, id: InvoiceId, pdf: &[u8]) -> Result<PathBuf, FatturaError> {
        let number = self.invoice(id)?.number.clone();
        std::fs::create_dir_all(&self.config.pdf_dir)?;
        let path = self.config.pdf_dir.join(pdf_filename(&number));
        std::fs::write(&path, pdf)?;

        if let Some(invoice) = self.documents.get_mut(id) {
            invoice.pdf_path = Some(path.clone());
        }
        tracing::info!(number = %number, path = %path.display(), bytes = pdf.len(), "PDF attached");
        Ok(path)
    }

    /// Draft → Created. The courtesy copy must already be attached.
    pub fn finalize(&mut self, id: InvoiceId) -> Result<(), FatturaError> {
        let invoice = self.invoice(id)?;
        if invoice.pdf_path.is_none() {
            return Err(FatturaError::Lifecycle(format!(
                "invoice {} has no PDF attached",
                invoice.number
            )));
        }
        self.set_state(id, InvoiceState::Created, Transition::Normal)?;
        Ok(())
    }

    /// Bytes of the stored courtesy copy.
    pub fn read_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, FatturaError> {
        let invoice = self.invoice(id)?;
        let Some(path) = invoice.pdf_path.as_deref() else {
            tracing::warn!(number = %invoice.number, "no PDF recorded for invoice");
            return Err(FatturaError::NotFound(format!(
                "PDF for invoice {}",
                invoice.number
            )));
        };
        read_artifact(path, &invoice.number)
    }

    /// File name offered when downloading the courtesy copy.
    pub fn pdf_download_name(&self, id: InvoiceId) -> Result<String, FatturaError> {
        Ok(pdf_filename(&self.invoice(id)?.number))
    }

    /// Transmission to the exchange system.
    pub fn send(&mut self, id: InvoiceId) -> Result<(), FatturaError> {
        let invoice = self.invoice(id)?;
        Err(FatturaError::NotImplemented(format!(
            "sending invoice {} to SdI",
            invoice.number
        )))
    }

    /// Zip package with XML and PDF.
    pub fn download_package(&self, id: InvoiceId) -> Result<Vec<u8>, FatturaError> {
        let invoice = self.invoice(id)?;
        Err(FatturaError::NotImplemented(format!(
            "package download for invoice {}",
            invoice.number
        )))
    }

    pub fn proforma_pdf(&self, id: InvoiceId) -> Result<Vec<u8>, FatturaError> {
        let invoice = self.invoice(id)?;
        Err(FatturaError::NotImplemented(format!(
            "pro-forma for invoice {}",
            invoice.number
        )))
    }

    /// Passive invoices from suppliers.
    pub fn received_invoices(&self) -> Result<Vec<Invoice>, FatturaError> {
        Err(FatturaError::NotImplemented("received invoices".into()))
    }

    /// Build and validate an invoice from the form without touching state.
    fn checked_invoice(
        &self,
        draft: &InvoiceDraft,
        number: String,
        issue_date: NaiveDate,
    ) -> Result<Invoice, FatturaError> {
        if draft.lines.len() > MAX_LINES {
            return Err(FatturaError::Validation(format!(
                "lines: an invoice cannot have more than {MAX_LINES} lines"
            )));
        }
        let stamp_duty = if draft.stamp_duty {
            self.config.stamp_duty_amount
        } else {
            Decimal::ZERO
        };

        let mut builder = InvoiceBuilder::new(number, issue_date)
            .doc_type(draft.doc_type)
            .counterparty_ref(ContactId(0), draft.counterparty.clone())
            .lines(draft.lines.iter().cloned())
            .payment(draft.payment.clone())
            .stamp_duty(stamp_duty);
        if let Some(notes) = non_blank(&draft.notes) {
            builder = builder.notes(notes);
        }
        let invoice = builder.build_unchecked()?;

        let mut errors = validate_counterparty(&draft.counterparty, &draft.counterparty_details);
        errors.extend(
            validate_invoice(&invoice)
                .into_iter()
                .filter(|e| e.field != "counterparty"),
        );
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "invoice form rejected");
            return Err(FatturaError::from_validation(&errors));
        }
        Ok(invoice)
    }
}

fn read_artifact(path: &Path, number: &str) -> Result<Vec<u8>, FatturaError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(number, path = %path.display(), "PDF file missing");
            Err(FatturaError::NotFound(format!(
                "PDF for invoice {number} at {}",
                path.display()
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// `<number>.pdf`, with `/` replaced so the name is a single path component.
pub fn pdf_filename(number: &str) -> String {
    format!("{}.pdf", number.replace('/', "-"))
}

/// `<number>.xml`.
pub fn xml_filename(number: &str) -> String {
    format!("{}.xml", number.replace('/', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fattura-session-{}", uuid::Uuid::new_v4()))
    }

    fn session() -> Session {
        let issuer = Issuer::new("Studio Bianchi", "01234567890", Address::default());
        Session::new(
            issuer,
            SessionConfig {
                pdf_dir: scratch_dir(),
                ..SessionConfig::default()
            },
        )
    }

    fn draft(name: &str) -> InvoiceDraft {
        InvoiceDraft {
            counterparty: name.into(),
            counterparty_details: ContactDetails {
                vat_number: Some("09876543210".into()),
                ..Default::default()
            },
            lines: vec![
                InvoiceLine::new("Consulenza", dec!(2), dec!(100), VatRate::Standard),
                InvoiceLine::new("Trasferta", dec!(1), dec!(50), VatRate::Standard),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_number_and_upserts_contact() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 3, 10)).unwrap();
        let inv = s.invoice(id).unwrap();
        assert_eq!(inv.number, "FT2025001");
        assert_eq!(inv.state, InvoiceState::Draft);
        assert_eq!(inv.totals.total, dec!(305.00));
        assert_eq!(s.contacts().len(), 1);
        assert_eq!(s.counterparty_of(id).unwrap().denomination, "Acme Srl");

        let second = s.create_invoice(draft("Acme Srl"), day(2025, 3, 11)).unwrap();
        assert_eq!(s.invoice(second).unwrap().number, "FT2025002");
        assert_eq!(s.contacts().len(), 1);
    }

    #[test]
    fn rejected_draft_changes_nothing() {
        let mut s = session();
        let mut bad = draft("Acme Srl");
        bad.counterparty_details.vat_number = None;
        bad.lines.clear();
        let err = s.create_invoice(bad, day(2025, 3, 10)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("counterparty"));
        assert!(msg.contains("lines"));
        assert!(s.documents().is_empty());
        assert!(s.contacts().is_empty());
    }

    #[test]
    fn stamp_duty_uses_configured_amount() {
        let mut s = session();
        let mut d = draft("Acme Srl");
        d.stamp_duty = true;
        let id = s.create_invoice(d, day(2025, 3, 10)).unwrap();
        assert_eq!(s.invoice(id).unwrap().totals.total, dec!(307.00));
        assert!(s.draft_for(id).unwrap().stamp_duty);
    }

    #[test]
    fn duplicate_resets_state_and_artifacts() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        s.attach_pdf(id, b"%PDF-1.4").unwrap();
        s.finalize(id).unwrap();

        let copy = s.duplicate(id, day(2025, 2, 1)).unwrap();
        let (orig, dup) = (s.invoice(id).unwrap(), s.invoice(copy).unwrap());
        assert_eq!(dup.number, "FT2025002");
        assert_eq!(dup.issue_date, day(2025, 2, 1));
        assert_eq!(dup.state, InvoiceState::Draft);
        assert!(dup.pdf_path.is_none());
        assert_eq!(dup.lines, orig.lines);
        assert_eq!(dup.totals, orig.totals);
        assert_eq!(orig.state, InvoiceState::Created);
        assert!(orig.pdf_path.is_some());

        let _ = std::fs::remove_dir_all(&s.config().pdf_dir);
    }

    #[test]
    fn delete_is_permanent_and_numbers_continue() {
        let mut s = session();
        let a = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        let b = s.create_invoice(draft("Acme Srl"), day(2025, 1, 11)).unwrap();
        s.delete(a).unwrap();
        assert!(s.invoice(a).is_err());
        assert!(matches!(s.delete(a), Err(FatturaError::NotFound(_))));
        assert_eq!(s.invoice(b).unwrap().number, "FT2025002");
        let c = s.create_invoice(draft("Acme Srl"), day(2025, 1, 12)).unwrap();
        assert_eq!(s.invoice(c).unwrap().number, "FT2025003");
    }

    #[test]
    fn edit_recomputes_and_keeps_number() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        let mut form = s.draft_for(id).unwrap();
        form.lines.truncate(1);
        s.edit(id, form).unwrap();
        let inv = s.invoice(id).unwrap();
        assert_eq!(inv.number, "FT2025001");
        assert_eq!(inv.totals.total, dec!(244.00));
    }

    #[test]
    fn sent_invoice_is_read_only() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        s.set_state(id, InvoiceState::Sent, Transition::Normal).unwrap();
        let form = s.draft_for(id).unwrap();
        assert!(matches!(s.edit(id, form), Err(FatturaError::Lifecycle(_))));
        assert!(s.set_state(id, InvoiceState::Draft, Transition::Normal).is_err());
        assert_eq!(
            s.set_state(id, InvoiceState::Created, Transition::Confirmed).unwrap(),
            InvoiceState::Created
        );
    }

    #[test]
    fn finalize_requires_pdf() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        assert!(matches!(s.finalize(id), Err(FatturaError::Lifecycle(_))));
        assert!(matches!(s.read_pdf(id), Err(FatturaError::NotFound(_))));

        let path = s.attach_pdf(id, b"%PDF-1.4 test").unwrap();
        assert!(path.ends_with("FT2025001.pdf"));
        assert_eq!(s.read_pdf(id).unwrap(), b"%PDF-1.4 test");
        s.finalize(id).unwrap();
        assert_eq!(s.invoice(id).unwrap().state, InvoiceState::Created);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(s.read_pdf(id), Err(FatturaError::NotFound(_))));
        let _ = std::fs::remove_dir_all(&s.config().pdf_dir);
    }

    #[test]
    fn edit_detaches_pdf_and_reopens_draft() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        s.attach_pdf(id, b"%PDF-1.4 old").unwrap();
        s.finalize(id).unwrap();

        let mut form = s.draft_for(id).unwrap();
        form.lines.truncate(1);
        s.edit(id, form).unwrap();
        let inv = s.invoice(id).unwrap();
        assert_eq!(inv.state, InvoiceState::Draft);
        assert!(inv.pdf_path.is_none());
        assert!(matches!(s.read_pdf(id), Err(FatturaError::NotFound(_))));
        assert!(matches!(s.finalize(id), Err(FatturaError::Lifecycle(_))));

        s.attach_pdf(id, b"%PDF-1.4 new").unwrap();
        s.finalize(id).unwrap();
        assert_eq!(s.read_pdf(id).unwrap(), b"%PDF-1.4 new");
        let _ = std::fs::remove_dir_all(&s.config().pdf_dir);
    }

    #[test]
    fn placeholders_never_succeed() {
        let mut s = session();
        let id = s.create_invoice(draft("Acme Srl"), day(2025, 1, 10)).unwrap();
        assert!(matches!(s.send(id), Err(FatturaError::NotImplemented(_))));
        assert!(matches!(
            s.download_package(id),
            Err(FatturaError::NotImplemented(_))
        ));
        assert!(matches!(s.proforma_pdf(id), Err(FatturaError::NotImplemented(_))));
        assert!(matches!(
            s.received_invoices(),
            Err(FatturaError::NotImplemented(_))
        ));
        assert_eq!(s.invoice(id).unwrap().state, InvoiceState::Draft);
    }

    #[test]
    fn file_names() {
        assert_eq!(pdf_filename("FT2025001"), "FT2025001.pdf");
        assert_eq!(pdf_filename("12/2025"), "12-2025.pdf");
        assert_eq!(xml_filename("FT2025001"), "FT2025001.xml");
    }
}
