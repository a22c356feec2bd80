//! Period summaries of issued documents.
//!
//! [`summarize`] aggregates the stored totals of one year's invoices into
//! twelve monthly rows, four quarterly rows and one annual row. Months and
//! quarters without documents are present with zero amounts.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Invoice, Table, format_eur, format_plain};

pub const MONTH_LABELS: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

pub const QUARTER_LABELS: [&str; 4] = [
    "1° Trimestre",
    "2° Trimestre",
    "3° Trimestre",
    "4° Trimestre",
];

pub const ANNUAL_LABEL: &str = "Annuale";

/// Columns of [`summary_table`].
pub const SUMMARY_COLUMNS: [&str; 5] = ["Anno", "Periodo", "Imponibile", "IVA", "Totale"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// 1 = January.
    Month(u32),
    /// 1..=4.
    Quarter(u32),
    Year,
}

impl Period {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Month(m) => MONTH_LABELS
                .get((*m as usize).wrapping_sub(1))
                .copied()
                .unwrap_or(""),
            Self::Quarter(q) => QUARTER_LABELS
                .get((*q as usize).wrapping_sub(1))
                .copied()
                .unwrap_or(""),
            Self::Year => ANNUAL_LABEL,
        }
    }

    /// Whether an invoice issued in `month` (1-based) falls in this period.
    pub fn contains_month(&self, month: u32) -> bool {
        match self {
            Self::Month(m) => *m == month,
            Self::Quarter(q) => (month + 2) / 3 == *q,
            Self::Year => (1..=12).contains(&month),
        }
    }
}

/// Aggregated amounts of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub period: Period,
    pub label: String,
    pub taxable: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub documents: usize,
}

impl SummaryRow {
    fn empty(period: Period) -> Self {
        Self {
            period,
            label: period.label().to_string(),
            taxable: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            documents: 0,
        }
    }

    /// Totals saturate at the `Decimal` range rather than overflow.
    fn add(&mut self, invoice: &Invoice) {
        self.taxable = self.taxable.saturating_add(invoice.totals.taxable);
        self.tax = self.tax.saturating_add(invoice.totals.tax);
        self.total = self.total.saturating_add(invoice.totals.total);
        self.documents += 1;
    }

    pub fn taxable_display(&self) -> String {
        format_eur(self.taxable)
    }

    pub fn tax_display(&self) -> String {
        format_eur(self.tax)
    }

    pub fn total_display(&self) -> String {
        format_eur(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub year: i32,
    /// January first.
    pub months: Vec<SummaryRow>,
    pub quarters: Vec<SummaryRow>,
    pub annual: SummaryRow,
}

impl Summary {
    /// Months, then quarters, then the annual row.
    pub fn rows(&self) -> impl Iterator<Item = &SummaryRow> {
        self.months
            .iter()
            .chain(self.quarters.iter())
            .chain(std::iter::once(&self.annual))
    }

    pub fn row(&self, period: Period) -> Option<&SummaryRow> {
        self.rows().find(|r| r.period == period)
    }
}

/// Aggregate the stored totals of the invoices issued in `year`.
pub fn summarize<'a, I>(invoices: I, year: i32) -> Summary
where
    I: IntoIterator<Item = &'a Invoice>,
{
    let mut months: Vec<SummaryRow> = (1..=12).map(|m| SummaryRow::empty(Period::Month(m))).collect();
    let mut quarters: Vec<SummaryRow> = (1..=4).map(|q| SummaryRow::empty(Period::Quarter(q))).collect();
    let mut annual = SummaryRow::empty(Period::Year);

    for invoice in invoices.into_iter().filter(|inv| inv.year() == year) {
        let month = invoice.month();
        months[(month - 1) as usize].add(invoice);
        quarters[((month - 1) / 3) as usize].add(invoice);
        annual.add(invoice);
    }

    Summary {
        year,
        months,
        quarters,
        annual,
    }
}

/// Distinct issue years, ascending.
pub fn available_years<'a, I>(invoices: I) -> Vec<i32>
where
    I: IntoIterator<Item = &'a Invoice>,
{
    invoices
        .into_iter()
        .map(Invoice::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Year preselected in views: the current one if it has documents,
/// otherwise the most recent one.
pub fn default_year(years: &[i32], current: i32) -> Option<i32> {
    if years.contains(&current) {
        Some(current)
    } else {
        years.iter().copied().max()
    }
}

/// Flat table of all seventeen rows, amounts as plain decimals.
pub fn summary_table(summary: &Summary) -> Table {
    let mut table = Table::new(&SUMMARY_COLUMNS);
    for row in summary.rows() {
        table.push_row(vec![
            summary.year.to_string(),
            row.label.clone(),
            format_plain(row.taxable),
            format_plain(row.tax),
            format_plain(row.total),
        ]);
    }
    table
}

/// Remote file name of a year's summary.
pub fn summary_file_name(year: i32) -> String {
    format!("riepilogo_{year}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_labels() {
        assert_eq!(Period::Month(1).label(), "Gennaio");
        assert_eq!(Period::Month(12).label(), "Dicembre");
        assert_eq!(Period::Month(0).label(), "");
        assert_eq!(Period::Quarter(3).label(), "3° Trimestre");
        assert_eq!(Period::Year.label(), "Annuale");
    }

    #[test]
    fn quarter_membership() {
        assert!(Period::Quarter(1).contains_month(3));
        assert!(!Period::Quarter(1).contains_month(4));
        assert!(Period::Quarter(4).contains_month(12));
        assert!(Period::Year.contains_month(7));
    }

    #[test]
    fn empty_year_has_all_rows() {
        let s = summarize(std::iter::empty(), 2025);
        assert_eq!(s.rows().count(), 17);
        assert!(s.rows().all(|r| r.total.is_zero() && r.documents == 0));
        assert_eq!(s.annual.total_display(), "0,00");
    }

    #[test]
    fn default_year_choice() {
        assert_eq!(default_year(&[2023, 2024], 2025), Some(2024));
        assert_eq!(default_year(&[2024, 2025], 2025), Some(2025));
        assert_eq!(default_year(&[], 2025), None);
        assert_eq!(summary_file_name(2025), "riepilogo_2025.csv");
    }
}
