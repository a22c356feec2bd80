use super::xml_utils::{XmlResult, XmlWriter};
use super::{DRAFT_NOTICE, FORMATO_TRASMISSIONE, ns};
use crate::core::*;

/// Render an invoice as a FatturaPA FPR12 document.
///
/// The output is a draft for preview and archiving: it is never validated
/// against the official schema and carries a leading comment saying so.
/// Totals come from `invoice.totals` as stored; nothing is recomputed, and
/// rendering the same invoice twice yields identical bytes.
pub fn render_draft_xml(invoice: &Invoice, issuer: &Issuer, counterparty: &Contact) -> XmlResult {
    let issuer_errors = validate_issuer(issuer);
    if !issuer_errors.is_empty() {
        return Err(FatturaError::from_validation(&issuer_errors));
    }
    if counterparty.tax_id().is_none() {
        return Err(FatturaError::Validation(format!(
            "counterparty: '{}' has neither VAT number nor fiscal code",
            counterparty.denomination
        )));
    }

    let mut w = XmlWriter::new()?;
    w.comment(DRAFT_NOTICE)?;
    w.start_element_with_attrs(
        "p:FatturaElettronica",
        &[
            ("versione", FORMATO_TRASMISSIONE),
            ("xmlns:ds", ns::DS),
            ("xmlns:p", ns::FATTURA),
            ("xmlns:xsi", ns::XSI),
        ],
    )?;

    w.start_element("FatturaElettronicaHeader")?;
    write_transmission(&mut w, invoice, issuer, counterparty)?;
    write_supplier(&mut w, issuer)?;
    write_customer(&mut w, counterparty)?;
    w.end_element("FatturaElettronicaHeader")?;

    w.start_element("FatturaElettronicaBody")?;
    write_general_data(&mut w, invoice)?;
    write_goods_and_services(&mut w, invoice)?;
    write_payment(&mut w, invoice)?;
    w.end_element("FatturaElettronicaBody")?;

    w.end_element("p:FatturaElettronica")?;
    let xml = w.into_string()?;
    tracing::debug!(number = %invoice.number, bytes = xml.len(), "draft XML rendered");
    Ok(xml)
}

fn write_transmission(
    w: &mut XmlWriter,
    invoice: &Invoice,
    issuer: &Issuer,
    counterparty: &Contact,
) -> Result<(), FatturaError> {
    w.start_element("DatiTrasmissione")?;
    w.start_element("IdTrasmittente")?;
    w.text_element("IdPaese", "IT")?;
    w.text_element("IdCodice", vat_digits(&issuer.vat_number))?;
    w.end_element("IdTrasmittente")?;
    w.text_element("ProgressivoInvio", &progressive(&invoice.number))?;
    w.text_element("FormatoTrasmissione", FORMATO_TRASMISSIONE)?;
    w.text_element("CodiceDestinatario", &counterparty.sdi_code)?;
    if counterparty.sdi_code == DEFAULT_SDI_CODE {
        w.opt_text_element("PECDestinatario", counterparty.pec.as_deref())?;
    }
    w.end_element("DatiTrasmissione")?;
    Ok(())
}

fn write_supplier(w: &mut XmlWriter, issuer: &Issuer) -> Result<(), FatturaError> {
    w.start_element("CedentePrestatore")?;
    w.start_element("DatiAnagrafici")?;
    w.start_element("IdFiscaleIVA")?;
    w.text_element("IdPaese", "IT")?;
    w.text_element("IdCodice", vat_digits(&issuer.vat_number))?;
    w.end_element("IdFiscaleIVA")?;
    w.opt_text_element("CodiceFiscale", issuer.fiscal_code.as_deref())?;
    w.start_element("Anagrafica")?;
    w.text_element("Denominazione", &issuer.denomination)?;
    w.end_element("Anagrafica")?;
    w.text_element("RegimeFiscale", issuer.tax_regime.code())?;
    w.end_element("DatiAnagrafici")?;
    write_address(w, &issuer.address)?;
    w.end_element("CedentePrestatore")?;
    Ok(())
}

fn write_customer(w: &mut XmlWriter, contact: &Contact) -> Result<(), FatturaError> {
    w.start_element("CessionarioCommittente")?;
    w.start_element("DatiAnagrafici")?;
    if let Some(vat) = non_blank(&contact.vat_number) {
        let (country, code) = split_vat(vat, &contact.address.country_code);
        w.start_element("IdFiscaleIVA")?;
        w.text_element("IdPaese", &country)?;
        w.text_element("IdCodice", code)?;
        w.end_element("IdFiscaleIVA")?;
    }
    w.opt_text_element("CodiceFiscale", contact.fiscal_code.as_deref())?;
    w.start_element("Anagrafica")?;
    w.text_element("Denominazione", &contact.denomination)?;
    w.end_element("Anagrafica")?;
    w.end_element("DatiAnagrafici")?;
    write_address(w, &contact.address)?;
    w.end_element("CessionarioCommittente")?;
    Ok(())
}

fn write_address(w: &mut XmlWriter, address: &Address) -> Result<(), FatturaError> {
    let cap = if address.postal_code.trim().is_empty() {
        "00000"
    } else {
        address.postal_code.trim()
    };
    w.start_element("Sede")?;
    w.text_element("Indirizzo", address.street.trim())?;
    w.text_element("CAP", cap)?;
    w.text_element("Comune", address.municipality.trim())?;
    w.opt_text_element("Provincia", Some(address.province.as_str()))?;
    w.text_element("Nazione", &address.country_code)?;
    w.end_element("Sede")?;
    Ok(())
}

fn write_general_data(w: &mut XmlWriter, invoice: &Invoice) -> Result<(), FatturaError> {
    w.start_element("DatiGenerali")?;
    w.start_element("DatiGeneraliDocumento")?;
    w.text_element("TipoDocumento", invoice.doc_type.code())?;
    w.text_element("Divisa", "EUR")?;
    w.text_element("Data", &invoice.issue_date.format("%Y-%m-%d").to_string())?;
    w.text_element("Numero", &invoice.number)?;
    if !invoice.totals.stamp_duty.is_zero() {
        w.start_element("DatiBollo")?;
        w.text_element("BolloVirtuale", "SI")?;
        w.amount_element("ImportoBollo", invoice.totals.stamp_duty)?;
        w.end_element("DatiBollo")?;
    }
    w.amount_element("ImportoTotaleDocumento", invoice.totals.total)?;
    w.opt_text_element("Causale", invoice.notes.as_deref())?;
    w.end_element("DatiGeneraliDocumento")?;
    w.end_element("DatiGenerali")?;
    Ok(())
}

fn write_goods_and_services(w: &mut XmlWriter, invoice: &Invoice) -> Result<(), FatturaError> {
    w.start_element("DatiBeniServizi")?;

    for (i, line) in invoice.lines.iter().enumerate() {
        w.start_element("DettaglioLinee")?;
        w.text_element("NumeroLinea", &(i + 1).to_string())?;
        w.text_element("Descrizione", &line.description)?;
        w.decimal_element("Quantita", line.quantity)?;
        w.decimal_element("PrezzoUnitario", line.unit_price)?;
        w.amount_element("PrezzoTotale", compute_line_totals(line)?.taxable)?;
        w.amount_element("AliquotaIVA", line.vat_rate.percent())?;
        if let Some(nature) = line.effective_nature() {
            w.text_element("Natura", nature.code())?;
        }
        w.end_element("DettaglioLinee")?;
    }

    for group in &invoice.totals.vat_summary {
        w.start_element("DatiRiepilogo")?;
        w.amount_element("AliquotaIVA", group.rate.percent())?;
        if let Some(nature) = group.nature {
            w.text_element("Natura", nature.code())?;
        }
        w.amount_element("ImponibileImporto", group.taxable)?;
        w.amount_element("Imposta", group.tax)?;
        if group.nature.is_none() {
            // Immediate VAT liability.
            w.text_element("EsigibilitaIVA", "I")?;
        }
        w.end_element("DatiRiepilogo")?;
    }

    w.end_element("DatiBeniServizi")?;
    Ok(())
}

fn write_payment(w: &mut XmlWriter, invoice: &Invoice) -> Result<(), FatturaError> {
    let payment = &invoice.payment;
    w.start_element("DatiPagamento")?;
    // Single full payment.
    w.text_element("CondizioniPagamento", "TP02")?;
    w.start_element("DettaglioPagamento")?;
    w.text_element("ModalitaPagamento", payment.method.code())?;
    if let Some(due) = payment.due_date {
        w.text_element("DataScadenzaPagamento", &due.format("%Y-%m-%d").to_string())?;
    }
    w.amount_element("ImportoPagamento", invoice.totals.total)?;
    if let Some(iban) = non_blank(&payment.iban) {
        let compact: String = iban.chars().filter(|c| !c.is_whitespace()).collect();
        w.text_element("IBAN", &compact)?;
    }
    w.end_element("DettaglioPagamento")?;
    w.end_element("DatiPagamento")?;
    Ok(())
}

fn vat_digits(vat: &str) -> &str {
    vat.trim().trim_start_matches("IT")
}

/// Split "DE123456789" into ("DE", "123456789"); numbers without a
/// country prefix take the address country.
fn split_vat<'a>(vat: &'a str, fallback_country: &str) -> (String, &'a str) {
    let vat = vat.trim();
    let has_prefix = vat.len() > 2 && vat.as_bytes()[..2].iter().all(u8::is_ascii_alphabetic);
    if has_prefix {
        (vat[..2].to_ascii_uppercase(), &vat[2..])
    } else {
        (fallback_country.to_ascii_uppercase(), vat)
    }
}

/// ProgressivoInvio: up to 10 alphanumerics taken from the invoice number.
fn progressive(number: &str) -> String {
    let alnum: String = number.chars().filter(char::is_ascii_alphanumeric).collect();
    let skip = alnum.len().saturating_sub(10);
    alnum[skip..].to_string()
}
