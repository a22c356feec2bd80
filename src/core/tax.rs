use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::{FatturaError, ValidationError};
use super::types::*;

/// Flat stamp duty (bollo virtuale) added after VAT when enabled.
pub const STAMP_DUTY_AMOUNT: Decimal = dec!(2.00);

/// Taxable amount and tax of one line, unrounded.
///
/// Fails with a validation error when the product does not fit in a
/// [`Decimal`].
pub fn compute_line_totals(line: &InvoiceLine) -> Result<LineTotals, FatturaError> {
    let taxable = line
        .quantity
        .checked_mul(line.unit_price)
        .ok_or_else(|| out_of_range("quantity × unit price"))?;
    let tax = taxable
        .checked_mul(line.vat_rate.percent())
        .and_then(|t| t.checked_div(dec!(100)))
        .ok_or_else(|| out_of_range("line tax"))?;
    Ok(LineTotals { taxable, tax })
}

/// Aggregate totals for a set of lines.
///
/// Lines are grouped by (rate, nature). Each group's taxable amount and tax
/// are summed exactly and rounded half-up to cents once; the invoice taxable
/// and tax are the sums of the rounded groups, so the summary block always
/// adds up to the totals. `stamp_duty` is added after VAT.
pub fn compute_invoice_totals(
    lines: &[InvoiceLine],
    stamp_duty: Decimal,
) -> Result<Totals, FatturaError> {
    let mut groups: BTreeMap<(VatRate, Option<VatNature>), (Decimal, Decimal)> = BTreeMap::new();

    for line in lines {
        let lt = compute_line_totals(line)?;
        let entry = groups
            .entry((line.vat_rate, line.effective_nature()))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 = checked_sum([entry.0, lt.taxable], "taxable amount")?;
        entry.1 = checked_sum([entry.1, lt.tax], "tax")?;
    }

    let vat_summary: Vec<VatSummary> = groups
        .into_iter()
        .map(|((rate, nature), (taxable, tax))| VatSummary {
            rate,
            nature,
            taxable: round_cents(taxable),
            tax: round_cents(tax),
        })
        .collect();

    let taxable = checked_sum(vat_summary.iter().map(|s| s.taxable), "taxable amount")?;
    let tax = checked_sum(vat_summary.iter().map(|s| s.tax), "tax")?;
    let stamp_duty = round_cents(stamp_duty);

    Ok(Totals {
        taxable,
        tax,
        stamp_duty,
        total: checked_sum([taxable, tax, stamp_duty], "total")?,
        vat_summary,
    })
}

/// Sum that reports overflow instead of panicking.
pub fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &str,
) -> Result<Decimal, FatturaError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| out_of_range(what))
}

fn out_of_range(what: &str) -> FatturaError {
    FatturaError::Validation(
        ValidationError::new("lines", format!("{what} is too large")).to_string(),
    )
}

/// Round to cents using half-up (commercial rounding).
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a user-entered amount or quantity.
///
/// Accepts `1234.5`, `1234,50`, `1.234,50` and an optional leading `€`.
/// Non-numeric and negative input is rejected rather than read as zero.
pub fn parse_amount(field: &str, text: &str) -> Result<Decimal, FatturaError> {
    let cleaned = text.trim().trim_start_matches('€').trim();
    if cleaned.is_empty() {
        return Err(FatturaError::Validation(
            ValidationError::new(field, "a number is required").to_string(),
        ));
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        cleaned.to_string()
    };

    let value = Decimal::from_str(&normalized).map_err(|_| {
        FatturaError::Validation(
            ValidationError::new(field, format!("'{text}' is not a number")).to_string(),
        )
    })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(FatturaError::Validation(
            ValidationError::new(field, format!("'{text}' must not be negative")).to_string(),
        ));
    }
    Ok(value)
}

/// Build a line from raw form input, rejecting malformed numbers.
pub fn parse_line(
    description: &str,
    quantity: &str,
    unit_price: &str,
    vat_rate: VatRate,
) -> Result<InvoiceLine, FatturaError> {
    let quantity = parse_amount("quantity", quantity)?;
    let unit_price = parse_amount("unit_price", unit_price)?;
    Ok(InvoiceLine::new(description, quantity, unit_price, vat_rate))
}
