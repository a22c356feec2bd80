use rust_decimal::Decimal;

use super::error::ValidationError;
use super::registry::validate_sdi_code;
use super::tax::checked_sum;
use super::types::*;

/// Validate a built invoice. Returns all errors found (not just the first).
pub fn validate_invoice(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.number.trim().is_empty() {
        errors.push(ValidationError::new("number", "invoice number must not be empty"));
    }

    if invoice.counterparty_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "counterparty",
            "counterparty denomination must not be empty",
        ));
    }

    if invoice.lines.is_empty() {
        errors.push(ValidationError::new("lines", "at least one line is required"));
    }

    for (i, line) in invoice.lines.iter().enumerate() {
        validate_line(line, i, &mut errors);
    }

    if !invoice.lines.is_empty() && invoice.totals.taxable <= Decimal::ZERO {
        errors.push(ValidationError::new(
            "totals.taxable",
            "invoice amount must be greater than zero",
        ));
    }

    if let Some(iban) = &invoice.payment.iban {
        if !is_plausible_iban(iban) {
            errors.push(ValidationError::new(
                "payment.iban",
                format!("'{iban}' is not a valid IBAN"),
            ));
        }
    }

    errors.extend(validate_arithmetic(&invoice.totals));
    errors
}

/// Check the internal consistency of stored totals.
pub fn validate_arithmetic(totals: &Totals) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let taxables = totals.vat_summary.iter().map(|s| s.taxable);
    let Ok(summary_taxable) = checked_sum(taxables, "taxable") else {
        errors.push(ValidationError::new("totals.vat_summary", "VAT summary is too large"));
        return errors;
    };
    if totals.taxable != summary_taxable {
        errors.push(ValidationError::new(
            "totals.taxable",
            format!(
                "taxable {} does not match VAT summary {}",
                totals.taxable, summary_taxable
            ),
        ));
    }

    let Ok(summary_tax) = checked_sum(totals.vat_summary.iter().map(|s| s.tax), "tax") else {
        errors.push(ValidationError::new("totals.vat_summary", "VAT summary is too large"));
        return errors;
    };
    if totals.tax != summary_tax {
        errors.push(ValidationError::new(
            "totals.tax",
            format!("tax {} does not match VAT summary {}", totals.tax, summary_tax),
        ));
    }

    let expected_total = checked_sum([totals.taxable, totals.tax, totals.stamp_duty], "total");
    if !expected_total.is_ok_and(|t| t == totals.total) {
        errors.push(ValidationError::new(
            "totals.total",
            format!(
                "total {} does not match taxable {} + tax {} + stamp duty {}",
                totals.total, totals.taxable, totals.tax, totals.stamp_duty
            ),
        ));
    }

    errors
}

/// Validate a counterparty as entered on the invoice form: a denomination
/// and at least one tax identifier are required.
pub fn validate_counterparty(denomination: &str, details: &ContactDetails) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if denomination.trim().is_empty() {
        errors.push(ValidationError::new(
            "counterparty.denomination",
            "denomination must not be empty",
        ));
    }

    let vat = non_blank(&details.vat_number);
    let cf = non_blank(&details.fiscal_code);
    if vat.is_none() && cf.is_none() {
        errors.push(ValidationError::new(
            "counterparty",
            "either a VAT number (P.IVA) or a fiscal code (C.F.) is required",
        ));
    }

    let domestic = details.address.country_code.eq_ignore_ascii_case("IT");
    if let Some(vat) = vat {
        if domestic && !is_italian_vat_number(vat) {
            errors.push(ValidationError::new(
                "counterparty.vat_number",
                format!("'{vat}' is not an 11-digit Italian VAT number"),
            ));
        }
    }
    if let Some(cf) = cf {
        if domestic && !is_italian_fiscal_code(cf) {
            errors.push(ValidationError::new(
                "counterparty.fiscal_code",
                format!("'{cf}' is not a valid fiscal code"),
            ));
        }
    }

    if let Some(code) = &details.sdi_code {
        if let Err(e) = validate_sdi_code(code) {
            errors.push(ValidationError::new("counterparty.sdi_code", e.to_string()));
        }
    }

    errors
}

/// Validate the issuer profile used on rendered documents.
pub fn validate_issuer(issuer: &Issuer) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if issuer.denomination.trim().is_empty() {
        errors.push(ValidationError::new(
            "issuer.denomination",
            "denomination must not be empty",
        ));
    }
    if !is_italian_vat_number(&issuer.vat_number) {
        errors.push(ValidationError::new(
            "issuer.vat_number",
            format!("'{}' is not an 11-digit Italian VAT number", issuer.vat_number),
        ));
    }
    if issuer.address.municipality.trim().is_empty() {
        errors.push(ValidationError::new(
            "issuer.address.municipality",
            "municipality must not be empty",
        ));
    }
    errors
}

fn validate_line(line: &InvoiceLine, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("lines[{index}]");

    if line.description.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{prefix}.description"),
            "description must not be empty",
        ));
    }
    if line.quantity.is_sign_negative() && !line.quantity.is_zero() {
        errors.push(ValidationError::new(
            format!("{prefix}.quantity"),
            "quantity must not be negative",
        ));
    }
    if line.unit_price.is_sign_negative() && !line.unit_price.is_zero() {
        errors.push(ValidationError::new(
            format!("{prefix}.unit_price"),
            "unit price must not be negative",
        ));
    }
    if line.nature.is_some() && line.vat_rate != VatRate::Zero {
        errors.push(ValidationError::new(
            format!("{prefix}.nature"),
            "a VAT nature code only applies to zero-rated lines",
        ));
    }
}

/// Partita IVA: 11 digits.
pub fn is_italian_vat_number(value: &str) -> bool {
    let v = value.trim().trim_start_matches("IT");
    v.len() == 11 && v.bytes().all(|b| b.is_ascii_digit())
}

/// Codice fiscale: 16 alphanumerics for people, 11 digits for companies.
pub fn is_italian_fiscal_code(value: &str) -> bool {
    let v = value.trim();
    (v.len() == 16 && v.bytes().all(|b| b.is_ascii_alphanumeric()))
        || (v.len() == 11 && v.bytes().all(|b| b.is_ascii_digit()))
}

fn is_plausible_iban(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 15 || compact.len() > 34 {
        return false;
    }
    let bytes = compact.as_bytes();
    if !bytes[..2].iter().all(u8::is_ascii_uppercase)
        || !bytes[2..4].iter().all(u8::is_ascii_digit)
        || !bytes.iter().all(u8::is_ascii_alphanumeric)
    {
        return false;
    }
    // ISO 13616 mod-97 check.
    let rearranged = format!("{}{}", &compact[4..], &compact[..4]);
    let mut remainder: u32 = 0;
    for ch in rearranged.chars() {
        let value = match ch.to_digit(36) {
            Some(v) => v,
            None => return false,
        };
        if value >= 10 {
            remainder = (remainder * 100 + value) % 97;
        } else {
            remainder = (remainder * 10 + value) % 97;
        }
    }
    remainder == 1
}
