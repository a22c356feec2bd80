use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::FatturaError;
use super::lifecycle::InvoiceState;
use super::session::MAX_LINES;
use super::tax::compute_invoice_totals;
use super::types::*;
use super::validation;

/// Builder for invoices with totals computed on build.
///
/// ```
/// use fattura::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("FT2025001", NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
///     .counterparty_ref(ContactId(1), "Acme Srl")
///     .add_line(InvoiceLine::new("Consulenza", dec!(2), dec!(100), VatRate::Standard))
///     .build()
///     .unwrap();
/// assert_eq!(invoice.totals.total, dec!(244.00));
/// ```
pub struct InvoiceBuilder {
    number: String,
    issue_date: NaiveDate,
    doc_type: DocumentType,
    counterparty: Option<(ContactId, String)>,
    lines: Vec<InvoiceLine>,
    notes: Option<String>,
    payment: Payment,
    stamp_duty: Decimal,
    state: InvoiceState,
    uuid: Option<Uuid>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            number: number.into(),
            issue_date,
            doc_type: DocumentType::Invoice,
            counterparty: None,
            lines: Vec::new(),
            notes: None,
            payment: Payment::default(),
            stamp_duty: Decimal::ZERO,
            state: InvoiceState::Draft,
            uuid: None,
        }
    }

    pub fn doc_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    /// Address the invoice to a registry contact.
    pub fn counterparty(mut self, contact: &Contact) -> Self {
        self.counterparty = Some((contact.id, contact.denomination.clone()));
        self
    }

    pub fn counterparty_ref(mut self, id: ContactId, denomination: impl Into<String>) -> Self {
        self.counterparty = Some((id, denomination.into()));
        self
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn lines(mut self, lines: impl IntoIterator<Item = InvoiceLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn payment(mut self, payment: Payment) -> Self {
        self.payment = payment;
        self
    }

    /// Flat stamp duty added after VAT.
    pub fn stamp_duty(mut self, amount: Decimal) -> Self {
        self.stamp_duty = amount;
        self
    }

    pub fn state(mut self, state: InvoiceState) -> Self {
        self.state = state;
        self
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Build the invoice, computing totals and running validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Invoice, FatturaError> {
        if self.lines.len() > MAX_LINES {
            return Err(FatturaError::Validation(format!(
                "lines: an invoice cannot have more than {MAX_LINES} lines"
            )));
        }
        let invoice = self.build_unchecked()?;

        let errors = validation::validate_invoice(&invoice);
        if !errors.is_empty() {
            return Err(FatturaError::from_validation(&errors));
        }
        Ok(invoice)
    }

    /// Build without validation, e.g. when importing stored rows.
    pub fn build_unchecked(self) -> Result<Invoice, FatturaError> {
        let (counterparty, counterparty_name) = self.counterparty.ok_or_else(|| {
            FatturaError::Validation("counterparty: a counterparty is required".into())
        })?;

        let totals = compute_invoice_totals(&self.lines, self.stamp_duty)?;

        Ok(Invoice {
            doc_type: self.doc_type,
            number: self.number,
            issue_date: self.issue_date,
            counterparty,
            counterparty_name,
            lines: self.lines,
            notes: self.notes,
            payment: self.payment,
            totals,
            state: self.state,
            uuid: self.uuid,
            pdf_path: None,
        })
    }
}

/// Builder for [`Address`].
pub struct AddressBuilder {
    street: String,
    postal_code: String,
    municipality: String,
    province: String,
    country_code: String,
}

impl AddressBuilder {
    pub fn new(
        municipality: impl Into<String>,
        postal_code: impl Into<String>,
        province: impl Into<String>,
    ) -> Self {
        Self {
            street: String::new(),
            postal_code: postal_code.into(),
            municipality: municipality.into(),
            province: province.into(),
            country_code: "IT".into(),
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = street.into();
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            postal_code: self.postal_code,
            municipality: self.municipality,
            province: self.province,
            country_code: self.country_code,
        }
    }
}

/// Builder for [`ContactDetails`].
#[derive(Default)]
pub struct ContactDetailsBuilder {
    details: ContactDetails,
}

impl ContactDetailsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vat_number(mut self, vat: impl Into<String>) -> Self {
        self.details.vat_number = Some(vat.into());
        self
    }

    pub fn fiscal_code(mut self, cf: impl Into<String>) -> Self {
        self.details.fiscal_code = Some(cf.into());
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.details.address = address;
        self
    }

    pub fn sdi_code(mut self, code: impl Into<String>) -> Self {
        self.details.sdi_code = Some(code.into());
        self
    }

    pub fn pec(mut self, pec: impl Into<String>) -> Self {
        self.details.pec = Some(pec.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.details.email = Some(email.into());
        self
    }

    pub fn kind(mut self, kind: ContactKind) -> Self {
        self.details.kind = Some(kind);
        self
    }

    pub fn build(self) -> ContactDetails {
        self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn build_computes_totals() {
        let inv = InvoiceBuilder::new("FT2025001", date())
            .counterparty_ref(ContactId(1), "Acme Srl")
            .add_line(InvoiceLine::new("A", dec!(2), dec!(100), VatRate::Standard))
            .add_line(InvoiceLine::new("B", dec!(1), dec!(50), VatRate::Standard))
            .stamp_duty(dec!(2))
            .build()
            .unwrap();
        assert_eq!(inv.totals.taxable, dec!(250));
        assert_eq!(inv.totals.tax, dec!(55));
        assert_eq!(inv.totals.total, dec!(307));
        assert_eq!(inv.state, InvoiceState::Draft);
    }

    #[test]
    fn build_requires_counterparty() {
        let err = InvoiceBuilder::new("FT2025001", date())
            .add_line(InvoiceLine::new("A", dec!(1), dec!(100), VatRate::Standard))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("counterparty"));
    }

    #[test]
    fn build_collects_all_errors() {
        let err = InvoiceBuilder::new("", date())
            .counterparty_ref(ContactId(1), "Acme Srl")
            .build()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("number"));
        assert!(msg.contains("lines"));
    }

    #[test]
    fn build_unchecked_skips_validation() {
        let inv = InvoiceBuilder::new("FT2025001", date())
            .counterparty_ref(ContactId(1), "Acme Srl")
            .build_unchecked()
            .unwrap();
        assert!(inv.lines.is_empty());
        assert_eq!(inv.totals.total, dec!(0));
    }

    #[test]
    fn address_and_details_builders() {
        let addr = AddressBuilder::new("Milano", "20121", "MI")
            .street("Via Roma 1")
            .build();
        assert_eq!(addr.country_code, "IT");
        let details = ContactDetailsBuilder::new()
            .vat_number("01234567890")
            .address(addr)
            .kind(ContactKind::Supplier)
            .build();
        assert_eq!(details.kind, Some(ContactKind::Supplier));
        assert_eq!(details.address.street, "Via Roma 1");
    }
}
