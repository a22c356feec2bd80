//! Italian-locale presentation of amounts and dates.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::FatturaError;
use super::tax::round_cents;

/// Format an amount the Italian way: `.` groups thousands, `,` separates
/// decimals, always two decimals. `1234.5` → `"1.234,50"`.
pub fn format_eur(amount: Decimal) -> String {
    let (negative, int_part, frac_part) = split_cents(amount);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part, '.'));
    out.push(',');
    out.push_str(&frac_part);
    out
}

/// Same output as [`format_eur`], produced by formatting with English
/// separators and swapping `,` and `.` afterwards.
pub fn format_eur_swapped(amount: Decimal) -> String {
    let (negative, int_part, frac_part) = split_cents(amount);
    let english = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        group_thousands(&int_part, ','),
        frac_part
    );
    english
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}

/// Format an amount with `€` and Italian separators: `"€ 1.234,50"`.
pub fn format_eur_symbol(amount: Decimal) -> String {
    format!("€ {}", format_eur(amount))
}

/// Plain two-decimal representation with a dot, used in flat tables.
pub fn format_plain(amount: Decimal) -> String {
    format!("{:.2}", round_cents(amount))
}

/// `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse `dd/mm/yyyy`; ISO `yyyy-mm-dd` is accepted too since older rows
/// were stored that way.
pub fn parse_date(text: &str) -> Result<NaiveDate, FatturaError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .map_err(|_| FatturaError::Validation(format!("date: '{text}' is not dd/mm/yyyy")))
}

fn split_cents(amount: Decimal) -> (bool, String, String) {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let s = format!("{:.2}", rounded.abs());
    match s.split_once('.') {
        Some((i, f)) => (negative, i.to_string(), f.to_string()),
        None => (negative, s, "00".to_string()),
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
